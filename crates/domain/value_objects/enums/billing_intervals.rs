use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Billing cadence of a recurring plan, spelled the way PayPal's `interval_unit` expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum BillingInterval {
    Month,
    Year,
}

impl BillingInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Month => "MONTH",
            BillingInterval::Year => "YEAR",
        }
    }

    /// Suffix used when naming the billing plan, e.g. "Organizer Pro Monthly".
    pub fn plan_name_suffix(&self) -> &'static str {
        match self {
            BillingInterval::Month => "Monthly",
            BillingInterval::Year => "Yearly",
        }
    }
}

impl Display for BillingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
