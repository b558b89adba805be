//! 模型计价表
//!
//! token 单价以「美元 / 百万 token」计，未收录的模型按 0 成本处理。

use phf::phf_map;
use tracing::debug;

/// 单个模型的计价（美元 / 百万 token）
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub prompt_per_million: f64,
    pub completion_per_million: f64,
}

/// 已收录模型的计价表
static MODEL_PRICING: phf::Map<&'static str, ModelPricing> = phf_map! {
    "gpt-4o" => ModelPricing { prompt_per_million: 2.50, completion_per_million: 10.00 },
    "gpt-4o-mini" => ModelPricing { prompt_per_million: 0.15, completion_per_million: 0.60 },
    "gpt-4.1" => ModelPricing { prompt_per_million: 2.00, completion_per_million: 8.00 },
    "gpt-4.1-mini" => ModelPricing { prompt_per_million: 0.40, completion_per_million: 1.60 },
    "gpt-4.1-nano" => ModelPricing { prompt_per_million: 0.10, completion_per_million: 0.40 },
};

/// 查询模型计价
pub fn lookup(model: &str) -> Option<&'static ModelPricing> {
    MODEL_PRICING.get(model)
}

/// 计算单次调用的成本（美元）
///
/// # 参数
/// - `model`: 模型名称
/// - `prompt_tokens`: 输入 token 数
/// - `completion_tokens`: 输出 token 数
///
/// # 返回
/// 未收录的模型返回 0.0
pub fn completion_cost(model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    match lookup(model) {
        Some(pricing) => {
            (prompt_tokens as f64 / 1_000_000.0) * pricing.prompt_per_million
                + (completion_tokens as f64 / 1_000_000.0) * pricing.completion_per_million
        }
        None => {
            debug!("模型 {} 未收录计价，成本记为 0", model);
            0.0
        }
    }
}
