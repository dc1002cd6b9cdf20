//! 数据模型定义

pub mod item;
pub mod request;
pub mod task;

pub use item::{
    BucketSpec, GeneratedItem, GradingMethod, GradingResult, JudgeVerdict, Modality, QuotaBucket,
    Verdict,
};
pub use request::GenerationRequest;
pub use task::{PipelineTaskState, TaskStage};
