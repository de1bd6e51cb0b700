use crate::domain::value_objects::{
    enums::{billing_intervals::BillingInterval, subscription_plans::SubscriptionPlan},
    money::DEFAULT_CURRENCY,
};

/// Static description of a recurring tier. Compiled in; prices are snapshotted onto
/// subscription records at creation time so later edits here never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlanConfig {
    pub plan: SubscriptionPlan,
    pub name: &'static str,
    pub description: &'static str,
    pub amount_minor: i64,
    pub currency: &'static str,
    pub interval: BillingInterval,
}

pub const PRO_PLAYER: SubscriptionPlanConfig = SubscriptionPlanConfig {
    plan: SubscriptionPlan::ProPlayer,
    name: "Pro Player",
    description: "Advanced stats, priority matchmaking, and premium features for players.",
    amount_minor: 999,
    currency: DEFAULT_CURRENCY,
    interval: BillingInterval::Month,
};

pub const ORGANIZER_PRO: SubscriptionPlanConfig = SubscriptionPlanConfig {
    plan: SubscriptionPlan::OrganizerPro,
    name: "Organizer Pro",
    description: "Unlimited games, advanced management tools, and premium organizer features.",
    amount_minor: 1999,
    currency: DEFAULT_CURRENCY,
    interval: BillingInterval::Month,
};

/// Default purchase-unit description for one-time boost payments.
pub const BOOST_GAME_DESCRIPTION: &str = "Boost Game";

/// Returns the recurring configuration for a plan, or `None` for one-time purchases.
pub fn plan_config(plan: SubscriptionPlan) -> Option<&'static SubscriptionPlanConfig> {
    match plan {
        SubscriptionPlan::ProPlayer => Some(&PRO_PLAYER),
        SubscriptionPlan::OrganizerPro => Some(&ORGANIZER_PRO),
        SubscriptionPlan::BoostGame => None,
    }
}

impl SubscriptionPlanConfig {
    pub fn billing_plan_name(&self) -> String {
        format!("{} {}", self.name, self.interval.plan_name_suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurring_plans_have_configs() {
        let organizer = plan_config(SubscriptionPlan::OrganizerPro).unwrap();
        assert_eq!(organizer.amount_minor, 1999);
        assert_eq!(organizer.currency, "USD");
        assert_eq!(organizer.billing_plan_name(), "Organizer Pro Monthly");

        let pro = plan_config(SubscriptionPlan::ProPlayer).unwrap();
        assert_eq!(pro.amount_minor, 999);
        assert_eq!(pro.interval, BillingInterval::Month);
    }

    #[test]
    fn boost_is_not_a_recurring_plan() {
        assert!(plan_config(SubscriptionPlan::BoostGame).is_none());
    }
}
