//! 出题服务 - 业务能力层
//!
//! 基于检索到的上下文，让 LLM 生成带编号的疾病问题列表。

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::clients::LlmClient;
use crate::config::Config;
use crate::services::usage_tracker::{CallUsage, UsageTracker};

/// 出题服务
pub struct QuestionGenerator {
    llm: LlmClient,
    tracker: Arc<UsageTracker>,
    model: String,
}

impl QuestionGenerator {
    /// 创建新的出题服务
    pub fn new(llm: LlmClient, tracker: Arc<UsageTracker>, config: &Config) -> Self {
        Self {
            llm,
            tracker,
            model: config.generation_model.clone(),
        }
    }

    /// 生成问题列表
    ///
    /// # 参数
    /// - `context`: 拼接后的检索上下文
    /// - `disease_name`: 疾病名称
    /// - `num_questions`: 问题数量上限
    ///
    /// # 返回
    /// 返回去掉空行、裁剪到 `num_questions` 条的问题列表（保留编号前缀）
    pub async fn generate(
        &self,
        context: &str,
        disease_name: &str,
        num_questions: usize,
    ) -> Result<Vec<String>> {
        info!(
            "🤖 正在生成问题 (模型: {}, 数量上限: {})...",
            self.model, num_questions
        );

        let prompt = build_generation_prompt(disease_name, num_questions);
        let user_message = format!("{}\n\nContext: {}", prompt, context);

        let outcome = self.llm.chat(&self.model, &user_message, 0.7).await?;

        self.tracker
            .track(CallUsage::from_tokens(&self.model, outcome.usage))
            .await;

        let questions = parse_question_lines(&outcome.content, num_questions);
        info!("✓ 生成了 {} 个问题", questions.len());

        Ok(questions)
    }
}

/// 构建出题 prompt
///
/// 提示词措辞不要动（包括其中的拼写），下游按这套措辞调过模型行为。
fn build_generation_prompt(disease_name: &str, num_questions: usize) -> String {
    format!(
        r#"Generate {num} key questions about {disease} based on the context.
        If the amount of questions in the context is less then {num}, do not make more.
        Make sure the questions are based on the context.
        Each question should have multiple possible answers in the text.
        Return only numbered questions, one per line.
        MAKE SURE THE QUESTIONS ARE ABOUT {disease} ONLY AND DONT PROVIDE QUESTIONS THAT NOT RELAVANT TO {disease}"#,
        num = num_questions,
        disease = disease_name
    )
}

/// 把 LLM 响应拆成问题列表
///
/// 按行拆分、去掉首尾空白、丢弃空行，最多保留 `cap` 条。
fn parse_question_lines(content: &str, cap: usize) -> Vec<String> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(cap)
        .map(ToString::to_string)
        .collect()
}
