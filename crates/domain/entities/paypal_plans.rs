use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::paypal_plans;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = paypal_plans, primary_key(plan_key))]
pub struct PaypalPlanEntity {
    pub plan_key: String,
    pub paypal_product_id: String,
    pub paypal_plan_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = paypal_plans)]
pub struct InsertPaypalPlanEntity {
    pub plan_key: String,
    pub paypal_product_id: String,
    pub paypal_plan_id: String,
    pub name: String,
    pub amount_minor: i64,
    pub currency: String,
}
