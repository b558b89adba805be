//! 问题验证流程 - 流程层
//!
//! 核心职责：定义"一个问题"的完整验证流程
//!
//! 流程顺序：
//! 1. 调用验证服务提取答案
//! 2. 失败时降级为内联错误文本（单个问题不拖垮整批）
//! 3. 登记完成进度

use std::collections::HashSet;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::QaPair;
use crate::services::AnswerVerifier;
use crate::utils::truncate_text;
use crate::workflow::verify_ctx::VerifyCtx;

/// 问题验证流程
///
/// - 编排单个问题的验证
/// - 决定失败时的降级行为
/// - 不持有任何连接资源
/// - 只依赖业务能力（services）
pub struct VerifyFlow {
    verifier: AnswerVerifier,
    completed: Mutex<HashSet<usize>>,
    total: usize,
    verbose_logging: bool,
}

impl VerifyFlow {
    /// 创建新的验证流程
    ///
    /// # 参数
    /// - `verifier`: 答案验证服务
    /// - `total`: 本次请求的问题总数
    /// - `verbose_logging`: 是否打印每个问题的开始日志
    pub fn new(verifier: AnswerVerifier, total: usize, verbose_logging: bool) -> Self {
        Self {
            verifier,
            completed: Mutex::new(HashSet::new()),
            total,
            verbose_logging,
        }
    }

    /// 验证单个问题
    ///
    /// 永不返回 Err：验证失败时把错误文本写进 `verification` 字段，
    /// 保证每个问题在结果里都占一席。
    pub async fn run(&self, ctx: &VerifyCtx, question: &str, context: &str) -> QaPair {
        if self.verbose_logging {
            info!("{} 开始验证: {}", ctx, truncate_text(question, 80));
        }

        let pair = match self.verifier.verify(question, context).await {
            Ok(verification) => QaPair {
                question: question.to_string(),
                verification,
            },
            Err(e) => {
                warn!("{} ⚠️ 验证失败，记录错误文本: {}", ctx, e);
                QaPair {
                    question: question.to_string(),
                    verification: format!("Error occurred during processing: {}", e),
                }
            }
        };

        self.mark_completed(ctx).await;

        pair
    }

    /// 登记完成进度
    async fn mark_completed(&self, ctx: &VerifyCtx) {
        let mut completed = self.completed.lock().await;
        completed.insert(ctx.question_num);
        info!("{} ✓ 验证进度: {}/{}", ctx, completed.len(), self.total);
    }
}
