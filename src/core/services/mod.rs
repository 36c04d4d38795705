pub mod charge_service;
pub mod subscription_service;
pub mod summary_service;

pub use charge_service::{
    CatchupFailure, CatchupReport, ChargeService, AUTO_CHARGE_TAG, DEFAULT_FALLBACK_CATEGORY,
    SUBSCRIPTION_TAG,
};
pub use subscription_service::{SubscriptionOverview, SubscriptionService};
pub use summary_service::{
    CostSummary, MonthCrossCheck, MonthlyRecap, SummaryService, TopSubscriptionCost,
};
