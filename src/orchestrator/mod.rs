//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责单次分析请求的流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `analyzer` - 疾病分析编排器
//! - 连接外部资源（LLM 客户端、向量索引）
//! - 串联检索、生成、验证三个阶段
//! - 控制验证并发数量（Semaphore）
//! - 按编号整理结果并汇总用量
//!
//! ## 层次关系
//!
//! ```text
//! analyzer (处理一次分析请求)
//!     ↓
//! workflow::VerifyFlow (处理单个问题)
//!     ↓
//! services (能力层：embedding / retrieval / generate / verify / usage)
//!     ↓
//! clients (客户端层：LLM 接口、向量索引接口)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：analyzer 管流水线，VerifyFlow 管单个问题
//! 2. **资源隔离**：用量账本随编排器创建，请求之间互不影响
//! 3. **向下依赖**：编排层 → workflow → services → clients
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod analyzer;

// 重新导出主要类型
pub use analyzer::DiseaseAnalyzer;
