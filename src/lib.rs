//! # Disease Quiz Gen
//!
//! 一个基于检索增强的疾病问答出题服务
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 封装外部接口，只暴露能力
//! - `LlmClient` - 聊天补全 / 查询向量接口
//! - `VectorIndexClient` - 向量索引检索接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个动作
//! - `EmbeddingService` - 查询向量能力
//! - `ContextRetrieval` - 上下文检索能力
//! - `QuestionGenerator` - 出题能力
//! - `AnswerVerifier` - 答案验证能力
//! - `UsageTracker` - 用量账本
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个问题"的完整验证流程
//! - `VerifyCtx` - 上下文封装（问题编号 + 总数）
//! - `VerifyFlow` - 流程编排（验证 → 降级 → 进度记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/analyzer` - 单次分析请求的流水线和并发控制
//!
//! HTTP 表面在 `server` 模块，进程入口只做配置加载和启动。
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnalyzeRequest, AnalyzeResponse, QaPair, UsageSummary};
pub use orchestrator::DiseaseAnalyzer;
pub use workflow::{VerifyCtx, VerifyFlow};
