use serde::{Deserialize, Serialize};

/// 流水线任务阶段
///
/// 生命周期：`Queued → Allocating → Generating → Validating → Assembling → Done`，
/// 任意非终态均可进入 `Failed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStage {
    Queued,
    Allocating,
    Generating,
    Validating,
    Assembling,
    Done,
    Failed,
}

impl TaskStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStage::Done | TaskStage::Failed)
    }
}

impl std::fmt::Display for TaskStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskStage::Queued => "排队中",
            TaskStage::Allocating => "分配配额",
            TaskStage::Generating => "生成题目",
            TaskStage::Validating => "校验结果",
            TaskStage::Assembling => "组装题集",
            TaskStage::Done => "完成",
            TaskStage::Failed => "失败",
        };
        write!(f, "{}", name)
    }
}

/// 流水线任务状态
///
/// 每个任务只有一个写者（协调器），阶段转换串行发生，
/// `progress_percent` 单调不减。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTaskState {
    pub task_id: String,
    pub stage: TaskStage,
    pub progress_percent: u8,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: String,
}

impl PipelineTaskState {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            stage: TaskStage::Queued,
            progress_percent: 0,
            status: "任务已提交".to_string(),
            error: None,
            updated_at: now_string(),
        }
    }

    /// 推进到新阶段
    ///
    /// 进度只增不减：传入值小于当前值时保持当前值。
    pub fn advance(&mut self, stage: TaskStage, progress: u8, status: impl Into<String>) {
        self.stage = stage;
        self.progress_percent = self.progress_percent.max(progress.min(100));
        self.status = status.into();
        self.updated_at = now_string();
    }

    /// 标记任务失败，附带错误信息
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.stage = TaskStage::Failed;
        self.status = "任务失败".to_string();
        self.error = Some(message);
        self.updated_at = now_string();
    }
}

fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_monotonic() {
        let mut state = PipelineTaskState::new("t-1");
        state.advance(TaskStage::Allocating, 10, "分配中");
        state.advance(TaskStage::Generating, 30, "生成中");
        // 回退的进度值被忽略
        state.advance(TaskStage::Validating, 20, "校验中");
        assert_eq!(state.progress_percent, 30);
        assert_eq!(state.stage, TaskStage::Validating);
    }

    #[test]
    fn test_fail_is_terminal() {
        let mut state = PipelineTaskState::new("t-2");
        state.advance(TaskStage::Generating, 30, "生成中");
        state.fail("生成调用异常");
        assert!(state.stage.is_terminal());
        assert_eq!(state.error.as_deref(), Some("生成调用异常"));
    }
}
