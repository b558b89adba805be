use crate::error::{AppError, AppResult};

/// 程序配置文件
///
/// 密钥类字段没有默认值，必须通过环境变量提供；
/// 其余字段在环境变量缺失或解析失败时回退到默认值。
#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP 服务监听地址
    pub listen_addr: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- OpenAI 配置 ---
    pub openai_api_key: String,
    pub openai_api_base: String,
    /// 出题模型
    pub generation_model: String,
    /// 验证模型
    pub verification_model: String,
    /// 查询向量模型
    pub embedding_model: String,
    // --- Pinecone 配置 ---
    pub pinecone_api_key: String,
    pub pinecone_index_name: String,
    /// 索引数据面地址（为空时通过控制面解析）
    pub pinecone_index_host: Option<String>,
    /// 控制面地址
    pub pinecone_api_base: String,
    /// 向量检索返回的段落数量
    pub search_top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            verbose_logging: false,
            openai_api_key: String::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            generation_model: "gpt-4o".to_string(),
            verification_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            pinecone_api_key: String::new(),
            pinecone_index_name: String::new(),
            pinecone_index_host: None,
            pinecone_api_base: "https://api.pinecone.io".to_string(),
            search_top_k: 25,
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// # 返回
    /// 三个必填变量（`OPENAI_API_KEY`、`PINECONE_API_KEY`、
    /// `PINECONE_INDEX_NAME`）缺失时返回 `ConfigError::EnvVarNotFound`。
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();
        Ok(Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(default.listen_addr),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_api_base: std::env::var("OPENAI_API_BASE").unwrap_or(default.openai_api_base),
            generation_model: std::env::var("GENERATION_MODEL").unwrap_or(default.generation_model),
            verification_model: std::env::var("VERIFICATION_MODEL").unwrap_or(default.verification_model),
            embedding_model: std::env::var("EMBEDDING_MODEL").unwrap_or(default.embedding_model),
            pinecone_api_key: require_env("PINECONE_API_KEY")?,
            pinecone_index_name: require_env("PINECONE_INDEX_NAME")?,
            pinecone_index_host: std::env::var("PINECONE_INDEX_HOST").ok().filter(|v| !v.is_empty()),
            pinecone_api_base: std::env::var("PINECONE_API_BASE").unwrap_or(default.pinecone_api_base),
            search_top_k: std::env::var("SEARCH_TOP_K").ok().and_then(|v| v.parse().ok()).unwrap_or(default.search_top_k),
        })
    }
}

/// 读取必填环境变量
fn require_env(var_name: &str) -> AppResult<String> {
    std::env::var(var_name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::env_var_not_found(var_name))
}
