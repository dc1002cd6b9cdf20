//! 外部能力客户端

pub mod capabilities;
pub mod judge_client;
pub mod llm_client;

pub use capabilities::{Generator, Judge, JudgedScore, Scorer};
pub use judge_client::{JudgeClient, ScoringClient};
pub use llm_client::LlmClient;
