//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// 默认级别 info，可通过 `RUST_LOG` 环境变量覆盖。
/// 重复调用不报错（集成测试里每个用例都会调用一次）。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录服务启动信息
///
/// # 参数
/// - `listen_addr`: 监听地址
/// - `generation_model`: 出题模型
/// - `verification_model`: 验证模型
pub fn log_startup(listen_addr: &str, generation_model: &str, verification_model: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 服务启动 - 疾病问答生成模式");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📡 监听地址: {}", listen_addr);
    info!("🤖 出题模型: {} / 验证模型: {}", generation_model, verification_model);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
