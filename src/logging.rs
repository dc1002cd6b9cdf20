//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::item::{GeneratedItem, Modality};

/// 初始化全局日志订阅器
///
/// 级别优先读 `RUST_LOG` 环境变量，未设置时由 `verbose` 决定。
/// 重复调用是安全的（测试中各用例可能都会调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目生成流水线");
    info!("📊 最大并发数: {}", config.max_workers);
    info!("🔁 重试轮数上限: {}", config.max_retries);
    info!("🤖 生成模型: {}", config.llm_model_name);
    if config.judge_api_key.trim().is_empty() {
        info!("⚠️ 未配置评审凭证，评审降级为宽松模式");
    } else {
        info!("🧑‍⚖️ 评审模型: {}", config.judge_model_name);
    }
    info!("{}", "=".repeat(60));
}

/// 输出最终统计信息
pub fn print_final_stats(items: &[GeneratedItem], requested: u32, output_file: &str) {
    let objective = items
        .iter()
        .filter(|i| i.modality == Modality::Objective)
        .count();

    info!("\n{}", "=".repeat(60));
    info!("📊 生成完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 生成题目: {}/{}", items.len(), requested);
    info!("📋 客观题: {} / 主观题: {}", objective, items.len() - objective);
    info!("{}", "=".repeat(60));
    info!("\n题目已保存至: {}", output_file);
}
