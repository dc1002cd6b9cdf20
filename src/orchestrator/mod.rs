//! 编排层
//!
//! 三层结构，自上而下：
//!
//! 1. [`coordinator`]：流水线任务协调器，驱动阶段转换并对外发布进度
//! 2. [`generation`]：生成编排器，按配额桶并发派发工作单元
//! 3. [`retry`]：评审门控重试控制器，处理单个配额桶的生成-评审循环

pub mod coordinator;
pub mod generation;
pub mod retry;

pub use coordinator::PipelineTaskCoordinator;
pub use generation::GenerationOrchestrator;
pub use retry::JudgeGatedRetryController;
