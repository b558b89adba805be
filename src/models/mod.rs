pub mod analysis;
pub mod pricing;

pub use analysis::{
    AnalyzeRequest, AnalyzeResponse, QaPair, UsageSummary, DEFAULT_MAX_WORKERS,
    DEFAULT_NUM_QUESTIONS, MAX_NUM_QUESTIONS, MAX_WORKERS,
};
pub use pricing::{completion_cost, ModelPricing};
