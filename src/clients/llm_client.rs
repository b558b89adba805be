//! LLM API 客户端
//!
//! 持有 OpenAI 凭证，只暴露调用能力：
//! - Chat Completions（出题 / 验证）
//! - Embeddings（查询向量）
//!
//! ## 技术栈
//! - Chat 使用 `async-openai` crate 进行 API 调用
//! - Embeddings 走 `reqwest`（同一份凭证，`{api_base}/embeddings` 端点）
//! - 兼容 OpenAI API 的服务（可通过 `OPENAI_API_BASE` 指向代理）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError, LlmError};

/// 单次调用消耗的 token 数
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat 调用结果：响应内容 + token 用量
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub usage: TokenUsage,
}

/// LLM 客户端
#[derive(Clone)]
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            http: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            api_base: config.openai_api_base.clone(),
        }
    }

    /// 发送 Chat Completions 请求
    ///
    /// # 参数
    /// - `model`: 模型名称
    /// - `user_message`: 用户消息内容
    /// - `temperature`: 采样温度
    ///
    /// # 返回
    /// 返回响应内容和 token 用量；响应没有内容时报 `LlmError::EmptyContent`，
    /// 响应缺少 usage 字段时按 0 token 计。
    pub async fn chat(
        &self,
        model: &str,
        user_message: &str,
        temperature: f32,
    ) -> Result<ChatOutcome> {
        debug!("调用 LLM API，模型: {}, 温度: {}", model, temperature);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()?;
        let messages = vec![ChatCompletionRequestMessage::User(user_msg)];

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(temperature)
            .build()?;

        // 调用 API
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败 (模型: {}): {}", model, e);
            AppError::llm_api_failed(model, e)
        })?;

        // token 用量（部分兼容服务不返回 usage 字段）
        let usage = response
            .usage
            .as_ref()
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        // 提取响应内容（choices 为空和 content 为空是两种不同的上游故障）
        let choice = response.choices.first().ok_or_else(|| {
            AppError::Llm(LlmError::EmptyResponse {
                model: model.to_string(),
            })
        })?;
        let content = choice.message.content.clone().ok_or_else(|| {
            AppError::Llm(LlmError::EmptyContent {
                model: model.to_string(),
            })
        })?;

        debug!(
            "LLM API 调用成功，消耗 {} tokens (prompt {} + completion {})",
            usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
        );

        Ok(ChatOutcome { content, usage })
    }

    /// 请求文本的 embedding 向量
    ///
    /// # 参数
    /// - `model`: embedding 模型名称
    /// - `input`: 待向量化的文本
    ///
    /// # 返回
    /// 返回第一条输入对应的向量
    pub async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>> {
        let endpoint = self.embeddings_endpoint();
        debug!("调用 Embeddings API，模型: {}", model);

        let request = EmbeddingRequest {
            model,
            input: vec![input],
        };

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Embeddings API 请求失败: {}", e);
                AppError::api_request_failed(&endpoint, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Embeddings API 返回错误状态: {}", status);
            return Err(AppError::api_bad_response(
                &endpoint,
                Some(status.as_u16() as u64),
                Some(body),
            )
            .into());
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })
        })?;

        let row = parsed.data.into_iter().next().ok_or_else(|| {
            AppError::Api(ApiError::EmptyResponse {
                endpoint: endpoint.clone(),
            })
        })?;

        debug!("Embeddings API 调用成功，向量维度: {}", row.embedding.len());

        Ok(row.embedding)
    }

    fn embeddings_endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base.trim_end_matches('/'))
    }
}

// ========== Embeddings 接口数据结构 ==========

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}
