//! 分析请求 / 响应数据模型

use serde::{Deserialize, Serialize};

/// 默认生成的问题数量
pub const DEFAULT_NUM_QUESTIONS: usize = 20;
/// 单次请求允许生成的问题数量上限
pub const MAX_NUM_QUESTIONS: usize = 50;
/// 默认验证并发数
pub const DEFAULT_MAX_WORKERS: usize = 5;
/// 验证并发数上限
pub const MAX_WORKERS: usize = 10;

/// 分析请求体
///
/// 三个字段都允许缺省：`disease_name` 缺省由 HTTP 层拒绝，
/// 数量类字段缺省时取默认值并按上限截断。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub disease_name: Option<String>,
    pub num_questions: Option<usize>,
    pub max_workers: Option<usize>,
}

impl AnalyzeRequest {
    /// 生效的问题数量（默认 20，上限 50）
    pub fn effective_num_questions(&self) -> usize {
        self.num_questions
            .unwrap_or(DEFAULT_NUM_QUESTIONS)
            .min(MAX_NUM_QUESTIONS)
    }

    /// 生效的验证并发数（默认 5，区间 [1, 10]）
    ///
    /// 下限为 1：零并发的信号量会让所有验证任务无限等待。
    pub fn effective_max_workers(&self) -> usize {
        self.max_workers
            .unwrap_or(DEFAULT_MAX_WORKERS)
            .clamp(1, MAX_WORKERS)
    }
}

/// 单个问题及其验证结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub verification: String,
}

/// 用量汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub total_tokens: u64,
    pub total_cost: f64,
}

/// 分析响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub disease: String,
    pub contexts: Vec<String>,
    pub qa_pairs: Vec<QaPair>,
    pub usage_stats: UsageSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_questions_defaults_and_cap() {
        let request = AnalyzeRequest::default();
        assert_eq!(request.effective_num_questions(), 20);

        let request = AnalyzeRequest {
            num_questions: Some(3),
            ..Default::default()
        };
        assert_eq!(request.effective_num_questions(), 3);

        let request = AnalyzeRequest {
            num_questions: Some(50),
            ..Default::default()
        };
        assert_eq!(request.effective_num_questions(), 50);

        let request = AnalyzeRequest {
            num_questions: Some(200),
            ..Default::default()
        };
        assert_eq!(request.effective_num_questions(), 50);

        // 0 是合法输入，产出空的 qa_pairs
        let request = AnalyzeRequest {
            num_questions: Some(0),
            ..Default::default()
        };
        assert_eq!(request.effective_num_questions(), 0);
    }

    #[test]
    fn test_max_workers_defaults_and_clamp() {
        let request = AnalyzeRequest::default();
        assert_eq!(request.effective_max_workers(), 5);

        let request = AnalyzeRequest {
            max_workers: Some(10),
            ..Default::default()
        };
        assert_eq!(request.effective_max_workers(), 10);

        let request = AnalyzeRequest {
            max_workers: Some(64),
            ..Default::default()
        };
        assert_eq!(request.effective_max_workers(), 10);

        // 0 会让信号量死锁，收到下限 1
        let request = AnalyzeRequest {
            max_workers: Some(0),
            ..Default::default()
        };
        assert_eq!(request.effective_max_workers(), 1);
    }

    #[test]
    fn test_request_deserialize_partial_body() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"disease_name": "asthma"}"#).unwrap();
        assert_eq!(request.disease_name.as_deref(), Some("asthma"));
        assert!(request.num_questions.is_none());
        assert!(request.max_workers.is_none());
    }

    #[test]
    fn test_request_rejects_negative_counts() {
        // usize 反序列化直接拒绝负数，HTTP 层按非法 JSON 处理
        let result = serde_json::from_str::<AnalyzeRequest>(
            r#"{"disease_name": "asthma", "num_questions": -5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let response = AnalyzeResponse {
            disease: "asthma".to_string(),
            contexts: vec!["passage one".to_string()],
            qa_pairs: vec![QaPair {
                question: "1. What is asthma?".to_string(),
                verification: "ANSWERS:\n* a chronic disease".to_string(),
            }],
            usage_stats: UsageSummary {
                total_tokens: 321,
                total_cost: 0.0009,
            },
        };

        let raw = serde_json::to_value(&response).unwrap();
        assert_eq!(raw["disease"], "asthma");
        assert_eq!(raw["contexts"][0], "passage one");
        assert_eq!(raw["qa_pairs"][0]["question"], "1. What is asthma?");
        assert_eq!(raw["usage_stats"]["total_tokens"], 321);
    }
}
