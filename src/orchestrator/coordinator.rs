//! 流水线任务协调器
//!
//! 驱动一次完整的生成任务：配额分配 → 并发生成 → 校验编号 → 组装。
//! 任务状态经 `tokio::sync::watch` 通道对外发布，协调器是唯一写者，
//! 订阅方任意多。任何阶段出错即整体进入失败终态，不保留部分结果。

use tokio::sync::watch;
use tracing::{error, info};

use crate::allocator;
use crate::clients::{Generator, Judge};
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::models::item::{GeneratedItem, QuotaBucket};
use crate::models::request::GenerationRequest;
use crate::models::task::{PipelineTaskState, TaskStage};
use crate::orchestrator::generation::GenerationOrchestrator;

/// 流水线任务协调器
pub struct PipelineTaskCoordinator {
    state_tx: watch::Sender<PipelineTaskState>,
}

impl PipelineTaskCoordinator {
    /// 创建协调器并返回状态订阅端
    pub fn new(task_id: impl Into<String>) -> (Self, watch::Receiver<PipelineTaskState>) {
        let (state_tx, state_rx) = watch::channel(PipelineTaskState::new(task_id));
        (Self { state_tx }, state_rx)
    }

    /// 运行完整的生成任务
    ///
    /// 成功时状态收于 `Done`/100%，失败时收于 `Failed` 并携带错误信息；
    /// 失败任务的部分结果一律丢弃。
    pub async fn run<G: Generator, J: Judge>(
        &self,
        config: &Config,
        request: &GenerationRequest,
        generator: &G,
        judge: &J,
    ) -> PipelineResult<Vec<GeneratedItem>> {
        match self.execute(config, request, generator, judge).await {
            Ok(items) => {
                self.transition(
                    TaskStage::Done,
                    100,
                    format!("完成，共 {} 道题目", items.len()),
                );
                Ok(items)
            }
            Err(e) => {
                error!("❌ 流水线任务失败: {}", e);
                self.state_tx.send_modify(|state| state.fail(e.to_string()));
                Err(e)
            }
        }
    }

    async fn execute<G: Generator, J: Judge>(
        &self,
        config: &Config,
        request: &GenerationRequest,
        generator: &G,
        judge: &J,
    ) -> PipelineResult<Vec<GeneratedItem>> {
        self.transition(TaskStage::Allocating, 10, "分配配额");
        let buckets = allocator::allocate(request.total, &request.subjects)?;
        let hint = self.build_distribution_hint(request)?;
        for bucket in &buckets {
            info!("📋 配额桶 [{}]: {} 道题目 ({}%)", bucket.label, bucket.count, bucket.percentage);
        }

        self.transition(TaskStage::Generating, 20, "开始生成");
        let orchestrator = GenerationOrchestrator::new(generator, judge, config);
        self.transition(
            TaskStage::Generating,
            30,
            format!("已派发 {} 个配额桶", buckets.len()),
        );
        let items = orchestrator.generate_all(&buckets, &hint).await?;
        self.transition(
            TaskStage::Generating,
            60,
            format!("已收集 {} 道题目", items.len()),
        );

        self.transition(TaskStage::Validating, 80, "校验题目编号");
        verify_sequence(&items)?;

        self.transition(TaskStage::Assembling, 90, "组装题集");
        Ok(items)
    }

    /// 把题型和难度配额轴展开为提示词中的分布说明
    ///
    /// 两个轴都只影响提示词措辞，不参与分桶；轴缺省时不产生说明。
    fn build_distribution_hint(&self, request: &GenerationRequest) -> PipelineResult<String> {
        let mut lines = Vec::new();
        if !request.formats.is_empty() {
            let buckets = allocator::allocate(request.total, &request.formats)?;
            lines.push(format!("题型分布: {}", describe_axis(&buckets)));
        }
        if !request.difficulties.is_empty() {
            let buckets = allocator::allocate(request.total, &request.difficulties)?;
            lines.push(format!("难度分布: {}", describe_axis(&buckets)));
        }
        Ok(lines.join("\n"))
    }

    fn transition(&self, stage: TaskStage, progress: u8, status: impl Into<String>) {
        let status = status.into();
        info!("[{}] {}% - {}", stage, progress, status);
        self.state_tx
            .send_modify(|state| state.advance(stage, progress, status));
    }
}

fn describe_axis(buckets: &[QuotaBucket]) -> String {
    buckets
        .iter()
        .map(|b| format!("{} {} 道", b.label, b.count))
        .collect::<Vec<_>>()
        .join("、")
}

/// 校验题目编号从 1 开始连续无空洞
fn verify_sequence(items: &[GeneratedItem]) -> PipelineResult<()> {
    for (index, item) in items.iter().enumerate() {
        let expected = (index + 1) as u32;
        if item.sequence_id != expected {
            return Err(PipelineError::Other(format!(
                "题目编号不连续: 第 {} 个位置的编号为 {}",
                expected, item.sequence_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::Modality;

    fn item(sequence_id: u32) -> GeneratedItem {
        GeneratedItem {
            sequence_id,
            modality: Modality::FreeForm,
            prompt_text: "题干".to_string(),
            choices: None,
            answer_key: "答案".to_string(),
            explanation: String::new(),
            difficulty_label: String::new(),
            subject_label: String::new(),
        }
    }

    #[test]
    fn test_verify_sequence_gapless() {
        let items: Vec<_> = (1..=5).map(item).collect();
        assert!(verify_sequence(&items).is_ok());
        assert!(verify_sequence(&[]).is_ok());
    }

    #[test]
    fn test_verify_sequence_detects_gap() {
        let items = vec![item(1), item(3)];
        assert!(verify_sequence(&items).is_err());
    }
}
