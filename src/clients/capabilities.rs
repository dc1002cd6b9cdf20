//! 外部能力抽象
//!
//! 流水线消费的三个外部能力以 trait 注入：生成、评审、主观题判分。
//! 客户端对象由调用方显式构造后传入编排层，没有模块级单例，
//! 测试中可以替换为任意桩实现。能力的线上格式归外部协作方所有。

use std::future::Future;

use anyhow::Result;

use crate::error::PipelineResult;
use crate::models::item::{GeneratedItem, JudgeVerdict};

/// 文本生成能力
///
/// 恢复器不假设返回内容遵守了任何结构化格式要求。
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// 题目评审能力
pub trait Judge: Send + Sync {
    fn judge(&self, item: &GeneratedItem) -> impl Future<Output = PipelineResult<JudgeVerdict>> + Send;

    /// 评审能力是否可用
    ///
    /// 无凭证时返回 `false`，上层整批降级为宽松模式。
    fn is_available(&self) -> bool {
        true
    }
}

/// 主观题判分返回
#[derive(Debug, Clone)]
pub struct JudgedScore {
    /// 0-100 分
    pub score: f64,
    pub feedback: String,
}

/// 主观题判分能力
pub trait Scorer: Send + Sync {
    fn score(
        &self,
        question: &str,
        key: &str,
        student_answer: &str,
        context: &str,
    ) -> impl Future<Output = PipelineResult<JudgedScore>> + Send;
}
