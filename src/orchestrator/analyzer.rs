//! 疾病分析编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责单次分析请求的完整流水线和并发控制。
//!
//! ## 核心功能
//!
//! 1. **连接资源**：创建 LLM 客户端、解析向量索引地址
//! 2. **检索上下文**：查询向量 → top-k 相似段落
//! 3. **生成问题**：基于拼接上下文出题
//! 4. **并发验证**：使用 Semaphore 限制并发数量，逐题验证
//! 5. **结果整理**：按编号稳定排序，汇总 token 用量与成本
//!
//! ## 设计特点
//!
//! - **每请求一个实例**：请求之间不共享用量账本
//! - **并发安全**：通过 Semaphore 和 tokio::spawn 实现并发
//! - **向下委托**：委托 workflow::VerifyFlow 处理单个问题

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::{LlmClient, VectorIndexClient};
use crate::config::Config;
use crate::models::{AnalyzeResponse, QaPair, UsageSummary};
use crate::services::{
    AnswerVerifier, ContextRetrieval, EmbeddingService, QuestionGenerator, UsageTracker,
};
use crate::utils::truncate_text;
use crate::workflow::{VerifyCtx, VerifyFlow};

/// 疾病分析编排器
pub struct DiseaseAnalyzer {
    config: Config,
    tracker: Arc<UsageTracker>,
    embedding: EmbeddingService,
    retrieval: ContextRetrieval,
    generator: QuestionGenerator,
    verifier: AnswerVerifier,
}

impl DiseaseAnalyzer {
    /// 连接外部资源并组装服务
    ///
    /// 每个请求构建一个新实例，用量账本从零开始。
    pub async fn connect(config: &Config) -> Result<Self> {
        let llm = LlmClient::new(config);
        let index = VectorIndexClient::connect(config).await?;
        let tracker = Arc::new(UsageTracker::new());

        Ok(Self {
            config: config.clone(),
            tracker: tracker.clone(),
            embedding: EmbeddingService::new(llm.clone(), config),
            retrieval: ContextRetrieval::new(index, config),
            generator: QuestionGenerator::new(llm.clone(), tracker.clone(), config),
            verifier: AnswerVerifier::new(llm, tracker, config),
        })
    }

    /// 完整的分析流水线
    ///
    /// # 参数
    /// - `disease_name`: 疾病名称
    /// - `num_questions`: 问题数量上限（HTTP 层已截断）
    /// - `max_workers`: 验证并发数（HTTP 层已截断）
    ///
    /// # 返回
    /// 返回完整的分析结果（响应体结构）
    pub async fn analyze(
        &self,
        disease_name: &str,
        num_questions: usize,
        max_workers: usize,
    ) -> Result<AnalyzeResponse> {
        log_analysis_start(disease_name, num_questions, max_workers);

        // 1. 查询向量
        info!("🧭 正在生成查询向量...");
        let query_embedding = self.embedding.embed_query(disease_name).await?;

        // 2. 检索上下文
        let (contexts, _metadatas) = self.retrieval.search(&query_embedding).await?;
        if contexts.is_empty() {
            warn!("⚠️ 未检索到任何上下文，流程继续");
        }
        if self.config.verbose_logging {
            log_contexts(&contexts);
        }
        let full_context = contexts.join(" ");

        // 3. 生成问题
        let questions = self
            .generator
            .generate(&full_context, disease_name, num_questions)
            .await?;

        // 4. 并发验证
        let qa_pairs = self
            .verify_all(&questions, &full_context, max_workers)
            .await?;

        // 5. 汇总
        let usage_stats = self.tracker.summary().await;
        log_analysis_complete(
            disease_name,
            qa_pairs.len(),
            self.tracker.call_count().await,
            &usage_stats,
        );

        Ok(AnalyzeResponse {
            disease: disease_name.to_string(),
            contexts,
            qa_pairs,
            usage_stats,
        })
    }

    /// 并发验证所有问题
    ///
    /// 信号量许可在 spawn 前获取，同时在途的验证任务不超过 `max_workers`；
    /// 任务 panic 时该问题以内联错误文本占位，批次不中断。
    async fn verify_all(
        &self,
        questions: &[String],
        full_context: &str,
        max_workers: usize,
    ) -> Result<Vec<QaPair>> {
        let total = questions.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        info!("📋 开始验证 {} 个问题 (并发上限: {})", total, max_workers);

        let semaphore = Arc::new(Semaphore::new(max_workers));
        let flow = Arc::new(VerifyFlow::new(
            self.verifier.clone(),
            total,
            self.config.verbose_logging,
        ));

        let mut handles = Vec::with_capacity(total);
        for (idx, question) in questions.iter().enumerate() {
            let question_num = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;

            let flow = flow.clone();
            let ctx = VerifyCtx::new(question_num, total);
            let question = question.clone();
            let context = full_context.to_string();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                flow.run(&ctx, &question, &context).await
            });
            handles.push(handle);
        }

        // 等待所有任务完成（spawn 顺序即收集顺序）
        let joined = join_all(handles).await;

        let mut qa_pairs = Vec::with_capacity(total);
        for (idx, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok(pair) => qa_pairs.push(pair),
                Err(e) => {
                    error!("[问题 {}] ❌ 任务执行失败: {}", idx + 1, e);
                    qa_pairs.push(QaPair {
                        question: questions[idx].clone(),
                        verification: format!("Error occurred during processing: {}", e),
                    });
                }
            }
        }

        // 按编号稳定排序（cached：排序键带告警日志，每个问题只算一次）
        qa_pairs.sort_by_cached_key(|pair| question_sort_key(&pair.question));

        Ok(qa_pairs)
    }
}

/// 问题的排序键：第一个 '.' 之前的纯数字前缀
///
/// 前缀不是纯数字、或数字超出 u64 范围时按 0 处理
/// （这些行排在最前，保持相对顺序），并打一条警告。
fn question_sort_key(question: &str) -> u64 {
    let prefix = question.split('.').next().unwrap_or("");
    if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) {
        match prefix.parse() {
            Ok(n) => n,
            Err(_) => {
                warn!(
                    "⚠️ 问题编号超出可解析范围，按 0 排序: {}",
                    truncate_text(question, 40)
                );
                0
            }
        }
    } else {
        warn!(
            "⚠️ 问题缺少数字编号前缀，按 0 排序: {}",
            truncate_text(question, 40)
        );
        0
    }
}

// ========== 日志辅助函数 ==========

fn log_analysis_start(disease_name: &str, num_questions: usize, max_workers: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始分析疾病: {}", disease_name);
    info!(
        "📊 问题数量上限: {} / 验证并发数: {}",
        num_questions, max_workers
    );
    info!("{}", "=".repeat(60));
}

fn log_contexts(contexts: &[String]) {
    for (i, passage) in contexts.iter().take(3).enumerate() {
        info!("  段落 {}: {}", i + 1, truncate_text(passage, 80));
    }
}

fn log_analysis_complete(
    disease_name: &str,
    pair_count: usize,
    call_count: usize,
    usage: &UsageSummary,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 分析完成: {}", disease_name);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 产出问答对: {}", pair_count);
    info!("📞 LLM 调用次数: {}", call_count);
    info!(
        "💰 token 总数: {} / 成本: ${:.6}",
        usage.total_tokens, usage.total_cost
    );
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 分析器测试用配置：后端地址指向本机不可达端口，不依赖外部服务
    fn unreachable_config() -> Config {
        Config {
            openai_api_key: "test-key".to_string(),
            openai_api_base: "http://127.0.0.1:1/v1".to_string(),
            pinecone_api_key: "test-key".to_string(),
            pinecone_index_host: Some("http://127.0.0.1:1".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_sort_key_numeric_prefix() {
        assert_eq!(question_sort_key("1. What causes asthma?"), 1);
        assert_eq!(question_sort_key("12. How is it treated?"), 12);
        assert_eq!(question_sort_key("012. Leading zeros are fine"), 12);
    }

    #[test]
    fn test_sort_key_non_numeric_prefix() {
        assert_eq!(question_sort_key("What causes asthma?"), 0);
        assert_eq!(question_sort_key("Q1. labelled question"), 0);
        assert_eq!(question_sort_key(""), 0);
    }

    #[test]
    fn test_sort_key_numeric_overflow_is_zero() {
        // 20 个 9 超出 u64 上限，和无编号一样按 0 处理
        assert_eq!(question_sort_key("99999999999999999999. overflow"), 0);
    }

    #[test]
    fn test_pairs_sort_stable_with_unnumbered_first() {
        let pair = |question: &str| QaPair {
            question: question.to_string(),
            verification: String::new(),
        };

        let mut pairs = vec![
            pair("3. third"),
            pair("first unnumbered"),
            pair("1. first"),
            pair("second unnumbered"),
            pair("2. second"),
        ];
        pairs.sort_by_cached_key(|p| question_sort_key(&p.question));

        let order: Vec<&str> = pairs.iter().map(|p| p.question.as_str()).collect();
        // 无编号的按 0 排在最前，且保持彼此的相对顺序
        assert_eq!(
            order,
            vec![
                "first unnumbered",
                "second unnumbered",
                "1. first",
                "2. second",
                "3. third"
            ]
        );
    }

    #[test]
    fn test_sort_key_ten_after_two() {
        // 数值排序，不是字典序
        let mut keys = vec![
            question_sort_key("10. ten"),
            question_sort_key("2. two"),
        ];
        keys.sort();
        assert_eq!(keys, vec![2, 10]);
    }

    /// 后端不可达时批次不中断：每个问题恰好产出一个按编号排列的问答对，
    /// 失败以内联错误文本占位
    #[tokio::test]
    async fn test_verify_all_one_pair_per_question_on_failure() {
        let analyzer = DiseaseAnalyzer::connect(&unreachable_config())
            .await
            .expect("索引地址已固定，连接不应访问网络");

        let questions: Vec<String> = (1..=7)
            .map(|i| format!("{}. question about asthma", i))
            .collect();

        let pairs = analyzer
            .verify_all(&questions, "some context", 3)
            .await
            .expect("降级批次不应返回错误");

        assert_eq!(pairs.len(), questions.len());
        for (pair, question) in pairs.iter().zip(&questions) {
            assert_eq!(&pair.question, question);
            assert!(
                pair.verification
                    .starts_with("Error occurred during processing:"),
                "unexpected verification text: {}",
                pair.verification
            );
        }
    }
}
