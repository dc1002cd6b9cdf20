//! 花括号配对提取与字段级正则提取
//!
//! 策略三、四共用一个带字符串状态的配对扫描：统计嵌套深度时跟踪
//! 字符串与转义状态，字符串字面量里的花括号不会造成错误分段。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("question|prompt|stem"));
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("correct_answer|answer"));
static EXPLANATION_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("explanation|analysis"));
static DIFFICULTY_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("difficulty"));
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| field_regex("type|modality"));

fn field_regex(names: &str) -> Regex {
    Regex::new(&format!(
        r#""?(?:{})"?\s*[:：]\s*"((?:[^"\\]|\\.)*)""#,
        names
    ))
    .unwrap()
}

/// 策略三：提取配对的 `{...}` 子串并逐个独立解析
///
/// 只保留解析成功且含必填字段的候选。
pub fn brace_extract(raw: &str) -> Option<Vec<Value>> {
    let blocks = balanced_blocks(raw);
    if blocks.is_empty() {
        return None;
    }

    let mut out = Vec::new();
    for block in blocks {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            if has_required_fields(&value) {
                out.push(value);
            }
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// 策略四：对候选块做逐字段正则提取
///
/// 解析失败的块改用每个字段单独的正则捞取；只有同时找到题干和
/// 答案的对象才保留，可选字段走默认值。
pub fn regex_extract(raw: &str) -> Option<Vec<Value>> {
    let blocks = balanced_blocks(raw);
    if blocks.is_empty() {
        return None;
    }

    let mut out = Vec::new();
    for block in blocks {
        if let Ok(value) = serde_json::from_str::<Value>(block) {
            if has_required_fields(&value) {
                out.push(value);
                continue;
            }
        }
        if let Some(value) = extract_fields(block) {
            out.push(value);
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn extract_fields(block: &str) -> Option<Value> {
    let question = field_value(block, &QUESTION_RE)?;
    let answer = field_value(block, &ANSWER_RE)?;

    let mut object = json!({
        "question": question,
        "correct_answer": answer,
    });
    if let Some(explanation) = field_value(block, &EXPLANATION_RE) {
        object["explanation"] = json!(explanation);
    }
    if let Some(difficulty) = field_value(block, &DIFFICULTY_RE) {
        object["difficulty"] = json!(difficulty);
    }
    if let Some(kind) = field_value(block, &TYPE_RE) {
        object["type"] = json!(kind);
    }
    Some(object)
}

fn field_value(block: &str, re: &Regex) -> Option<String> {
    let captured = re.captures(block)?.get(1)?.as_str();
    // 尽量按 JSON 字符串解码转义序列，失败就用原文
    serde_json::from_str::<String>(&format!("\"{}\"", captured))
        .ok()
        .or_else(|| Some(captured.to_string()))
}

/// 配对扫描：返回深度归零处切出的 `{...}` 子串
fn balanced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        blocks.push(&text[start..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    blocks
}

fn has_required_fields(value: &Value) -> bool {
    let has_question = ["question", "prompt", "stem"]
        .iter()
        .any(|k| value.get(k).is_some());
    let has_answer = ["correct_answer", "answer"]
        .iter()
        .any(|k| value.get(k).is_some());
    has_question && has_answer
}
