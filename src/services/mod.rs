pub mod answer_verifier;
pub mod embedding;
pub mod question_generator;
pub mod retrieval;
pub mod usage_tracker;

pub use answer_verifier::AnswerVerifier;
pub use embedding::EmbeddingService;
pub use question_generator::QuestionGenerator;
pub use retrieval::ContextRetrieval;
pub use usage_tracker::{CallUsage, UsageTracker};
