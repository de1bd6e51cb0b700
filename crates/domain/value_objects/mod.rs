pub mod enums;
pub mod money;
pub mod plans;
pub mod subscriptions;
