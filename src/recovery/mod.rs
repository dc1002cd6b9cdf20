//! 结构化输出恢复器
//!
//! 生成能力返回的原始文本经常不是合法 JSON。本模块用五级严格度递减的
//! 策略链从中抢救出结构化题目：
//!
//! 1. 严格解析：去掉围栏代码块标记后整体按 JSON 解析
//! 2. 结构性修复后解析（见 [`repair`]）
//! 3. 花括号配对提取，逐个独立解析（见 [`extract`]）
//! 4. 对解析失败的候选块做逐字段正则提取（见 [`extract`]）
//! 5. 放弃：返回前面策略中收获最多的结果
//!
//! 每个策略是一个纯函数 `fn(&str) -> Option<Vec<Value>>`，按序尝试，
//! 整段文本上第一个成功者胜出；存活的候选随后统一经过模式校验
//! （见 [`validate`]）和规范化修饰。对恶劣输入不会 panic，也不返回
//! `Err`——穷尽策略后把能捞到的都交出去，可能为空。

pub mod extract;
pub mod repair;
pub mod validate;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::models::item::{GeneratedItem, Modality};
use crate::normalize;

/// 恢复结果
///
/// 调用方按数据分支，不按异常分支。
#[derive(Debug)]
pub enum RecoveryOutcome {
    /// 策略一直接解析成功
    Parsed(Vec<GeneratedItem>),
    /// 经修复或提取策略恢复，附带告警说明
    Repaired {
        items: Vec<GeneratedItem>,
        warnings: Vec<String>,
    },
    /// 全部策略一无所获
    Empty { reason: String },
}

impl RecoveryOutcome {
    pub fn len(&self) -> usize {
        match self {
            RecoveryOutcome::Parsed(items) => items.len(),
            RecoveryOutcome::Repaired { items, .. } => items.len(),
            RecoveryOutcome::Empty { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取出题目列表（`Empty` 时为空）
    pub fn into_items(self) -> Vec<GeneratedItem> {
        match self {
            RecoveryOutcome::Parsed(items) => items,
            RecoveryOutcome::Repaired { items, .. } => items,
            RecoveryOutcome::Empty { .. } => Vec::new(),
        }
    }

    /// 转换为结果类型：`Empty` 映射为恢复耗尽错误
    ///
    /// 恢复耗尽只消耗一次生成尝试，不单独构成流水线失败。
    pub fn into_result(self, expected: usize) -> PipelineResult<Vec<GeneratedItem>> {
        match self {
            RecoveryOutcome::Empty { reason } => {
                Err(PipelineError::recovery_exhausted(expected, reason))
            }
            other => Ok(other.into_items()),
        }
    }
}

type Strategy = fn(&str) -> Option<Vec<Value>>;

/// 策略链，严格度递减
const STRATEGIES: &[(&str, Strategy)] = &[
    ("strict_parse", strict_parse),
    ("repair_parse", repair::repair_parse),
    ("brace_extract", extract::brace_extract),
    ("regex_extract", extract::regex_extract),
];

/// 从原始文本中恢复结构化题目
///
/// 返回的题目可能少于 `expected_count`；为缺口补发生成调用是
/// 重试控制器的职责，不在这里处理。
pub fn recover(raw_text: &str, expected_count: usize) -> RecoveryOutcome {
    let mut best: (usize, &str) = (0, "");

    for (strategy_index, (name, strategy)) in STRATEGIES.iter().enumerate() {
        let Some(candidates) = strategy(raw_text) else {
            continue;
        };
        if candidates.is_empty() {
            continue;
        }

        let candidate_count = candidates.len();
        let (raw_items, errors) = validate::validate_candidates(candidates);

        let mut warnings = Vec::new();
        for error in &errors {
            warn!(
                "候选对象 {} 缺少必填字段 {:?}，已丢弃",
                error.index, error.missing
            );
            warnings.push(format!(
                "候选对象 {} 缺少必填字段 {:?}",
                error.index, error.missing
            ));
        }

        if raw_items.is_empty() {
            if candidate_count > best.0 {
                best = (candidate_count, name);
            }
            continue;
        }

        let items: Vec<GeneratedItem> = raw_items.into_iter().map(finalize_item).collect();
        if items.len() < expected_count {
            debug!(
                "策略 {} 恢复 {} 道题目，少于期望的 {}",
                name,
                items.len(),
                expected_count
            );
        }

        if strategy_index == 0 && warnings.is_empty() {
            return RecoveryOutcome::Parsed(items);
        }
        if strategy_index > 0 {
            warnings.insert(0, format!("经策略 {} 恢复", name));
        }
        return RecoveryOutcome::Repaired { items, warnings };
    }

    let reason = if best.0 > 0 {
        format!(
            "策略 {} 提取到 {} 个候选对象，但均未通过字段校验",
            best.1, best.0
        )
    } else {
        "未能从原始文本中提取任何 JSON 对象".to_string()
    };
    RecoveryOutcome::Empty { reason }
}

/// 评审通过前的文本修饰
///
/// 题干与解析做控制字符清理和 LaTeX 命令修复，客观题答案归一为选项字母。
/// 题目被评审接受之后不再有任何修改。
fn finalize_item(mut item: GeneratedItem) -> GeneratedItem {
    item.prompt_text = normalize::repair_latex(&normalize::clean_text(&item.prompt_text));
    item.explanation = normalize::repair_latex(&normalize::clean_text(&item.explanation));
    if item.modality == Modality::Objective {
        if let Some(letter) = normalize::canonical_choice(&item.answer_key) {
            item.answer_key = letter.to_string();
        }
    }
    item
}

/// 策略一：整体严格解析
fn strict_parse(raw: &str) -> Option<Vec<Value>> {
    let text = strip_code_fence(raw);
    let value: Value = serde_json::from_str(text).ok()?;
    Some(collect_objects(value))
}

/// 去掉围栏代码块标记（```json ... ```）
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let Some(first_newline) = trimmed.find('\n') else {
        return trimmed;
    };
    let body = &trimmed[first_newline + 1..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// 把解析出的 JSON 值展开为候选对象列表
///
/// 接受裸数组、包着数组的对象（`items`/`questions`/`problems` 键）
/// 以及单个对象。
pub(crate) fn collect_objects(value: Value) -> Vec<Value> {
    match value {
        Value::Array(arr) => arr.into_iter().filter(|v| v.is_object()).collect(),
        Value::Object(mut map) => {
            for key in ["items", "questions", "problems"] {
                if let Some(Value::Array(arr)) = map.remove(key) {
                    return arr.into_iter().filter(|v| v.is_object()).collect();
                }
            }
            vec![Value::Object(map)]
        }
        _ => Vec::new(),
    }
}
