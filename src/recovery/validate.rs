//! 恢复候选的模式校验
//!
//! 恢复之后立刻把松散的 JSON 对象变成有类型的 [`GeneratedItem`]，
//! 缺字段的候选连同缺失清单一起报告给上层，而不是把 `get("字段")`
//! 式的类型歧义散落到下游。

use serde_json::Value;

use crate::models::item::{GeneratedItem, Modality};

/// 未通过校验的候选
#[derive(Debug)]
pub struct CandidateError {
    /// 候选在本批中的序号
    pub index: usize,
    /// 缺失的必填字段
    pub missing: Vec<&'static str>,
}

/// 逐个校验候选对象
///
/// 返回通过校验的题目和被丢弃候选的错误清单。
pub fn validate_candidates(values: Vec<Value>) -> (Vec<GeneratedItem>, Vec<CandidateError>) {
    let mut items = Vec::new();
    let mut errors = Vec::new();

    for (index, value) in values.iter().enumerate() {
        match candidate_to_item(value) {
            Ok(item) => items.push(item),
            Err(missing) => errors.push(CandidateError { index, missing }),
        }
    }

    (items, errors)
}

/// 单个候选对象 → 有类型的题目
///
/// 必填：题干与答案。可选字段走默认值；作答形式未标注时按
/// 有无选项推断。`sequence_id` 由编排层统一编号，这里置 0。
pub fn candidate_to_item(value: &Value) -> Result<GeneratedItem, Vec<&'static str>> {
    let question = text_field(value, &["question", "prompt", "stem"]);
    let answer = text_field(value, &["correct_answer", "answer"]);

    let mut missing = Vec::new();
    if question.is_none() {
        missing.push("question");
    }
    if answer.is_none() {
        missing.push("correct_answer");
    }
    if !missing.is_empty() {
        return Err(missing);
    }

    let choices = value
        .get("choices")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .map(|c| match c.as_str() {
                    Some(s) => s.to_string(),
                    None => c.to_string(),
                })
                .collect::<Vec<String>>()
        })
        .filter(|v| !v.is_empty());

    let modality = match value
        .get("type")
        .or_else(|| value.get("modality"))
        .and_then(Value::as_str)
    {
        Some("objective") | Some("客观题") | Some("选择题") => Modality::Objective,
        Some("free_form") | Some("subjective") | Some("主观题") => Modality::FreeForm,
        _ => {
            if choices.is_some() {
                Modality::Objective
            } else {
                Modality::FreeForm
            }
        }
    };

    Ok(GeneratedItem {
        sequence_id: 0,
        modality,
        prompt_text: question.unwrap_or_default(),
        choices,
        answer_key: answer.unwrap_or_default(),
        explanation: text_field(value, &["explanation", "analysis"]).unwrap_or_default(),
        difficulty_label: text_field(value, &["difficulty", "difficulty_label"]).unwrap_or_default(),
        subject_label: text_field(value, &["subject", "subject_label"]).unwrap_or_default(),
    })
}

/// 取字符串字段（多个别名键按序尝试，数字值也接受）
fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
