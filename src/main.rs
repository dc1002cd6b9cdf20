use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use worksheet_pipeline::{
    logging, Config, JudgeClient, LlmClient, PipelineTaskCoordinator,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    // 加载生成请求
    let request = worksheet_pipeline::load_request(Path::new(&config.request_file)).await?;

    // 构造外部能力客户端
    let generator = LlmClient::new(&config);
    let judge = JudgeClient::new(&config);

    // 运行流水线任务
    let task_id = format!("task-{}", chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let (coordinator, mut state_rx) = PipelineTaskCoordinator::new(task_id);

    // 订阅并打印进度变化
    let progress_logger = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow_and_update().clone();
            info!(
                "📍 任务 {} [{}] {}% - {}",
                state.task_id, state.stage, state.progress_percent, state.status
            );
            if state.stage.is_terminal() {
                break;
            }
        }
    });

    let items = coordinator
        .run(&config, &request, &generator, &judge)
        .await?;
    let _ = progress_logger.await;

    // 写出题目
    let json = serde_json::to_string_pretty(&items)?;
    tokio::fs::write(&config.output_file, json)
        .await
        .with_context(|| format!("无法写入输出文件: {}", config.output_file))?;

    logging::print_final_stats(&items, request.total, &config.output_file);

    Ok(())
}
