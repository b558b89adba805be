pub mod verify_ctx;
pub mod verify_flow;

pub use verify_ctx::VerifyCtx;
pub use verify_flow::VerifyFlow;
