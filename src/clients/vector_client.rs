//! 向量索引客户端
//!
//! 封装所有与 Pinecone 相关的调用逻辑：
//! - 控制面：按索引名称解析数据面地址
//! - 数据面：向量相似度检索（查询 top-k 段落）

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ApiError, AppError};

/// Pinecone 控制面 API 版本头
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2025-01";

/// 向量索引客户端
#[derive(Clone)]
pub struct VectorIndexClient {
    http: reqwest::Client,
    api_key: String,
    /// 数据面地址（含 scheme）
    host: String,
}

impl VectorIndexClient {
    /// 连接向量索引
    ///
    /// 优先使用配置中的 `pinecone_index_host`；未配置时通过控制面
    /// `GET {pinecone_api_base}/indexes/{name}` 解析数据面地址。
    pub async fn connect(config: &Config) -> Result<Self> {
        let http = reqwest::Client::new();

        let host = match &config.pinecone_index_host {
            Some(host) => host.clone(),
            None => {
                resolve_index_host(
                    &http,
                    &config.pinecone_api_base,
                    &config.pinecone_api_key,
                    &config.pinecone_index_name,
                )
                .await?
            }
        };

        let host = normalize_host(&host);
        info!("📌 向量索引已连接: {}", host);

        Ok(Self {
            http,
            api_key: config.pinecone_api_key.clone(),
            host,
        })
    }

    /// 相似度检索
    ///
    /// # 参数
    /// - `vector`: 查询向量
    /// - `top_k`: 返回的段落数量
    ///
    /// # 返回
    /// 返回按相似度排序的匹配列表（带 metadata）
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>> {
        let endpoint = format!("{}/query", self.host);
        debug!("向量检索: top_k = {}, 维度 = {}", top_k, vector.len());

        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
        };

        let response = self
            .http
            .post(&endpoint)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("向量检索请求失败: {}", e);
                AppError::api_request_failed(&endpoint, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("向量检索返回错误状态: {}", status);
            return Err(AppError::api_bad_response(
                &endpoint,
                Some(status.as_u16() as u64),
                Some(body),
            )
            .into());
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| {
            AppError::Api(ApiError::JsonParseFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })
        })?;

        debug!("向量检索完成，返回 {} 个匹配", parsed.matches.len());

        Ok(parsed.matches)
    }
}

/// 通过控制面解析索引的数据面地址
async fn resolve_index_host(
    http: &reqwest::Client,
    api_base: &str,
    api_key: &str,
    index_name: &str,
) -> Result<String> {
    let endpoint = format!("{}/indexes/{}", api_base.trim_end_matches('/'), index_name);
    debug!("解析索引地址: {}", endpoint);

    let response = http
        .get(&endpoint)
        .header("Api-Key", api_key)
        .header(API_VERSION_HEADER, API_VERSION)
        .send()
        .await
        .map_err(|e| {
            warn!("索引地址解析请求失败: {}", e);
            AppError::api_request_failed(&endpoint, e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(
            AppError::api_bad_response(&endpoint, Some(status.as_u16() as u64), Some(body)).into(),
        );
    }

    let description: IndexDescription = response.json().await.map_err(|e| {
        AppError::Api(ApiError::JsonParseFailed {
            endpoint: endpoint.clone(),
            source: Box::new(e),
        })
    })?;

    Ok(description.host)
}

/// 为裸主机名补上 https scheme，并去掉尾部斜杠
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

// ========== 接口数据结构 ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

/// 单个检索匹配
#[derive(Debug, Clone, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}
