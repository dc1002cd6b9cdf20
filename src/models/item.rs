use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 配额桶输入（仅标签与百分比，count 由分配器计算）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSpec {
    pub label: String,
    pub percentage: u32,
}

impl BucketSpec {
    pub fn new(label: impl Into<String>, percentage: u32) -> Self {
        Self {
            label: label.into(),
            percentage,
        }
    }
}

/// 配额桶（含分配后的题目数量）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaBucket {
    pub label: String,
    pub percentage: u32,
    pub count: u32,
}

/// 题目作答形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// 客观题（单一确定选项）
    Objective,
    /// 主观题（开放式作答）
    FreeForm,
}

/// 生成的题目
///
/// 由恢复器从原始文本构造；评审通过前归编排层所有，
/// 通过后所有权交给调用方（持久化在本核心之外）。
/// 评审通过后不再修改，规范化器的文本修饰只发生在通过之前。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub sequence_id: u32,
    pub modality: Modality,
    pub prompt_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub answer_key: String,
    pub explanation: String,
    pub difficulty_label: String,
    pub subject_label: String,
}

impl GeneratedItem {
    /// 题干预览（用于日志与反馈，最多 20 个字符）
    pub fn preview(&self) -> String {
        if self.prompt_text.chars().count() > 20 {
            self.prompt_text.chars().take(20).collect::<String>() + "…"
        } else {
            self.prompt_text.clone()
        }
    }
}

/// 评审结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Reject,
}

/// 评审结果
///
/// 即用即弃：由重试控制器立即消费，不做持久化。
#[derive(Debug, Clone)]
pub struct JudgeVerdict {
    pub item_ref: u32,
    /// 评分项名称 → 1-5 分
    pub scores: BTreeMap<String, f64>,
    pub verdict: Verdict,
    pub feedback: String,
}

impl JudgeVerdict {
    /// 所有评分项均达到阈值才算通过，部分达标不计
    pub fn meets(&self, threshold: f64) -> bool {
        !self.scores.is_empty() && self.scores.values().all(|s| *s >= threshold)
    }
}

/// 判分方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingMethod {
    /// 原始字符串完全一致
    Exact,
    /// 规范化后一致
    Normalized,
    /// 经外部判分能力打分
    Judged,
}

/// 判分结果（返回后不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResult {
    pub item_ref: u32,
    pub student_answer: String,
    pub normalized_student_answer: String,
    pub is_correct: bool,
    pub score: f64,
    pub method: GradingMethod,
    /// 判分调用失败时的诊断信息（失败降级为 0 分而非中止批次）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}
