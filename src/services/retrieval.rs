//! 上下文检索服务 - 业务能力层
//!
//! 从向量索引中检索与疾病相关的段落，并把段落文本与其余元数据拆开。

use anyhow::Result;
use serde_json::{Map, Value};
use tracing::info;

use crate::clients::{VectorIndexClient, VectorMatch};
use crate::config::Config;
use crate::error::AppError;

/// 上下文检索服务
pub struct ContextRetrieval {
    client: VectorIndexClient,
    top_k: usize,
}

impl ContextRetrieval {
    /// 创建新的检索服务
    pub fn new(client: VectorIndexClient, config: &Config) -> Self {
        Self {
            client,
            top_k: config.search_top_k,
        }
    }

    /// 检索相似段落
    ///
    /// # 参数
    /// - `query_embedding`: 查询向量
    ///
    /// # 返回
    /// 返回 (段落文本列表, 对应的元数据列表)，两个列表按相似度对齐；
    /// 元数据中不再包含 `text` 字段。
    pub async fn search(&self, query_embedding: &[f32]) -> Result<(Vec<String>, Vec<Value>)> {
        let matches = self.client.query(query_embedding, self.top_k).await?;
        info!("🔍 检索完成，命中 {} 个段落", matches.len());

        let mut documents = Vec::with_capacity(matches.len());
        let mut metadatas = Vec::with_capacity(matches.len());

        for matched in &matches {
            let (text, rest) = split_match_metadata(matched)?;
            documents.push(text);
            metadatas.push(rest);
        }

        Ok((documents, metadatas))
    }
}

/// 把单个匹配的 metadata 拆成段落文本和剩余字段
///
/// 索引中的段落以 `metadata.text` 存储，缺失视为索引数据损坏。
fn split_match_metadata(matched: &VectorMatch) -> Result<(String, Value)> {
    let metadata = matched
        .metadata
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| {
            AppError::api_bad_response(
                "/query",
                None,
                Some(format!("检索结果 {} 缺少 metadata", matched.id)),
            )
        })?;

    let text = metadata
        .get("text")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::api_bad_response(
                "/query",
                None,
                Some(format!("检索结果 {} 的 metadata 缺少 text 字段", matched.id)),
            )
        })?
        .to_string();

    let rest: Map<String, Value> = metadata
        .iter()
        .filter(|(key, _)| key.as_str() != "text")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok((text, Value::Object(rest)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use serde_json::json;

    fn match_with_metadata(metadata: Option<Value>) -> VectorMatch {
        VectorMatch {
            id: "doc-1".to_string(),
            score: Some(0.9),
            metadata,
        }
    }

    #[test]
    fn test_split_metadata_keeps_other_keys() {
        let matched = match_with_metadata(Some(json!({
            "text": "Asthma narrows the airways.",
            "page": 12,
            "source": "handbook.pdf"
        })));

        let (text, rest) = split_match_metadata(&matched).unwrap();
        assert_eq!(text, "Asthma narrows the airways.");
        assert_eq!(rest["page"], 12);
        assert_eq!(rest["source"], "handbook.pdf");
        assert!(rest.get("text").is_none());
    }

    #[test]
    fn test_split_metadata_text_only() {
        let matched = match_with_metadata(Some(json!({"text": "passage"})));

        let (text, rest) = split_match_metadata(&matched).unwrap();
        assert_eq!(text, "passage");
        assert_eq!(rest, json!({}));
    }

    #[test]
    fn test_missing_text_field_fails() {
        let matched = match_with_metadata(Some(json!({"page": 3})));
        let err = split_match_metadata(&matched).unwrap_err();
        // 损坏的索引数据归为 API 响应错误，消息带上匹配 id
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Api(ApiError::BadResponse { .. }))
        ));
        assert!(err.to_string().contains("doc-1"));
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn test_missing_metadata_fails() {
        let matched = match_with_metadata(None);
        assert!(split_match_metadata(&matched).is_err());
    }
}
