//! 用量统计服务 - 业务能力层
//!
//! 聚合一次分析请求中所有 LLM 调用的 token 数与美元成本。
//! 多个验证任务会并发写入，内部用异步互斥锁保护账本。

use tokio::sync::Mutex;
use tracing::debug;

use crate::clients::TokenUsage;
use crate::models::pricing;
use crate::models::UsageSummary;

/// 单次 LLM 调用的用量记录
#[derive(Debug, Clone)]
pub struct CallUsage {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub cost: f64,
}

impl CallUsage {
    /// 由 token 用量和模型名称生成一条记录（按计价表折算成本）
    pub fn from_tokens(model: &str, usage: TokenUsage) -> Self {
        let cost = pricing::completion_cost(model, usage.prompt_tokens, usage.completion_tokens);
        Self {
            model: model.to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cost,
        }
    }
}

/// 内部账本
#[derive(Debug, Default)]
struct UsageLog {
    total_tokens: u64,
    total_cost: f64,
    calls: Vec<CallUsage>,
}

/// 用量统计服务
///
/// 职责：
/// - 记录每次 LLM 调用的 token 数和成本
/// - 提供累计汇总
/// - 不关心调用来自哪个流程
#[derive(Debug, Default)]
pub struct UsageTracker {
    log: Mutex<UsageLog>,
}

impl UsageTracker {
    /// 创建空的统计服务
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次调用
    pub async fn track(&self, usage: CallUsage) {
        let mut log = self.log.lock().await;
        log.total_tokens += u64::from(usage.total_tokens);
        log.total_cost += usage.cost;
        debug!(
            "记录用量: {} tokens (模型: {}), 累计 {} tokens",
            usage.total_tokens, usage.model, log.total_tokens
        );
        log.calls.push(usage);
    }

    /// 当前累计用量
    pub async fn summary(&self) -> UsageSummary {
        let log = self.log.lock().await;
        UsageSummary {
            total_tokens: log.total_tokens,
            total_cost: log.total_cost,
        }
    }

    /// 已记录的调用次数
    pub async fn call_count(&self) -> usize {
        self.log.lock().await.calls.len()
    }
}
