//! 查询向量服务 - 业务能力层

use anyhow::Result;
use tracing::debug;

use crate::clients::LlmClient;
use crate::config::Config;

/// 查询向量服务
///
/// 只负责把查询文本变成向量；embedding 调用不计入用量统计。
#[derive(Clone)]
pub struct EmbeddingService {
    llm: LlmClient,
    model: String,
}

impl EmbeddingService {
    /// 创建新的查询向量服务
    pub fn new(llm: LlmClient, config: &Config) -> Self {
        Self {
            llm,
            model: config.embedding_model.clone(),
        }
    }

    /// 生成查询文本的向量
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        debug!("生成查询向量: {}", text);
        self.llm.embed(&self.model, text).await
    }
}
