//! 答案验证服务 - 业务能力层
//!
//! 对单个问题调用验证模型，从上下文中提取候选答案、正确答案、
//! 原文引用和页码引用。只处理单个问题，不关心并发与流程。

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::clients::LlmClient;
use crate::config::Config;
use crate::services::usage_tracker::{CallUsage, UsageTracker};
use crate::utils::truncate_text;

/// 验证 prompt（措辞不要动，下游按 ANSWERS / CORRECT / QUOTE / REFERENCE 段解析）
const VERIFICATION_PROMPT: &str = r#"Based on the context, extract:
1. All possible answer choices mentioned (as bullets)
2. The correct answer
3. The exact quote supporting the correct answer
4. Any referenced page/section numbers

Format exactly as:
ANSWERS:
* [answer choice 1]
* [answer choice 2]
etc.

CORRECT: [correct answer]
QUOTE: [exact quote]
REFERENCE: [page/section number]

You must make sure the answers make sense based in the question"#;

/// 答案验证服务
#[derive(Clone)]
pub struct AnswerVerifier {
    llm: LlmClient,
    tracker: Arc<UsageTracker>,
    model: String,
}

impl AnswerVerifier {
    /// 创建新的验证服务
    pub fn new(llm: LlmClient, tracker: Arc<UsageTracker>, config: &Config) -> Self {
        Self {
            llm,
            tracker,
            model: config.verification_model.clone(),
        }
    }

    /// 验证单个问题
    ///
    /// # 参数
    /// - `question`: 问题文本（带编号前缀）
    /// - `context`: 拼接后的检索上下文
    ///
    /// # 返回
    /// 返回验证模型的结构化文本输出
    pub async fn verify(&self, question: &str, context: &str) -> Result<String> {
        debug!("验证问题: {}", truncate_text(question, 60));

        let user_message = build_verification_message(question, context);
        let outcome = self.llm.chat(&self.model, &user_message, 0.0).await?;

        self.tracker
            .track(CallUsage::from_tokens(&self.model, outcome.usage))
            .await;

        Ok(outcome.content)
    }
}

/// 构建验证消息：上下文在前，问题在中，指令在后
fn build_verification_message(question: &str, context: &str) -> String {
    format!(
        "Context: {}\nQuestion: {}\n{}",
        context, question, VERIFICATION_PROMPT
    )
}
