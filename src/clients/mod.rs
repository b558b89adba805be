pub mod llm_client;
pub mod vector_client;

pub use llm_client::{ChatOutcome, LlmClient, TokenUsage};
pub use vector_client::{VectorIndexClient, VectorMatch};
