//! # Worksheet Pipeline
//!
//! 一个用于题目生成与判分的 LLM 流水线
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础能力层（Clients）
//! - `clients/` - 持有外部 LLM 能力，只暴露 trait 接口
//! - `LlmClient` - 文本生成能力（兼容 OpenAI API 的服务）
//! - `JudgeClient` / `ScoringClient` - 评审与主观题判分能力
//!
//! ### ② 业务能力层（核心算法）
//! - `allocator` - 配额分配，把百分比精确换算为整数题目数量
//! - `recovery/` - 结构化输出恢复，从不合规文本中抢救 JSON 题目
//! - `normalize` - 作答规范化（分数、OCR 误识、选项符号、LaTeX）
//! - `grading` - 判分引擎（客观题本地判定，主观题外部判分）
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/retry` - 评审门控重试控制器，处理单个配额桶
//! - `orchestrator/generation` - 生成编排器，并发派发配额桶
//! - `orchestrator/coordinator` - 任务协调器，驱动阶段转换并发布进度
//!
//! ## 模块结构

pub mod allocator;
pub mod clients;
pub mod config;
pub mod error;
pub mod grading;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod recovery;

// 重新导出常用类型
pub use clients::{Generator, Judge, JudgeClient, JudgedScore, LlmClient, Scorer, ScoringClient};
pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use grading::GradingEngine;
pub use models::item::{GeneratedItem, GradingResult, Modality, QuotaBucket};
pub use models::request::{load_request, GenerationRequest};
pub use models::task::{PipelineTaskState, TaskStage};
pub use orchestrator::PipelineTaskCoordinator;
pub use recovery::RecoveryOutcome;
