//! 生成编排器
//!
//! 每个配额桶是一个独立的工作单元，经信号量限流后并发执行各自的
//! 生成-评审循环。工作单元之间不共享可变状态，失败互不影响；
//! 全部收束后统一编号组装。

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::{Generator, Judge};
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::models::item::{GeneratedItem, QuotaBucket};
use crate::orchestrator::retry::JudgeGatedRetryController;

/// 生成编排器
pub struct GenerationOrchestrator<'a, G, J> {
    generator: &'a G,
    judge: &'a J,
    config: &'a Config,
}

impl<'a, G: Generator, J: Judge> GenerationOrchestrator<'a, G, J> {
    pub fn new(generator: &'a G, judge: &'a J, config: &'a Config) -> Self {
        Self {
            generator,
            judge,
            config,
        }
    }

    /// 并发处理所有配额桶，返回编号后的题目列表
    ///
    /// 单个桶的非致命失败只损失该桶的题目；致命错误（评审响应
    /// 解析失败等）中止整个批次。编号按桶的输入顺序从 1 开始
    /// 连续分配，与各工作单元的完成顺序无关。
    pub async fn generate_all(
        &self,
        buckets: &[QuotaBucket],
        distribution_hint: &str,
    ) -> PipelineResult<Vec<GeneratedItem>> {
        let workers = self.config.max_workers.min(buckets.len()).max(1);
        info!(
            "🚀 派发 {} 个配额桶，最大并发数: {}",
            buckets.len(),
            workers
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let tasks = buckets.iter().map(|bucket| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return (bucket, Err(PipelineError::Other(e.to_string())));
                    }
                };
                let controller = JudgeGatedRetryController::new(
                    self.generator,
                    self.judge,
                    self.config.judge_score_threshold,
                    self.config.max_retries,
                );
                (bucket, controller.fill_bucket(bucket, distribution_hint).await)
            }
        });

        let mut all_items = Vec::new();
        for (bucket, result) in join_all(tasks).await {
            match result {
                Ok(items) => all_items.extend(items),
                Err(e) if e.is_fatal() => {
                    error!("❌ [{}] 致命错误，中止批次: {}", bucket.label, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("⚠️ [{}] 配额桶处理失败，跳过: {}", bucket.label, e);
                }
            }
        }

        for (index, item) in all_items.iter_mut().enumerate() {
            item.sequence_id = (index + 1) as u32;
        }

        info!("✓ 共收集 {} 道题目", all_items.len());
        Ok(all_items)
    }
}
