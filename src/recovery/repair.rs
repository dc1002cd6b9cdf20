//! 结构性修复
//!
//! 固定顺序的文本修复序列：先把行内数学跨度藏到占位符后面
//! （修复用的正则不会碰到被保护的内容），再逐项修复常见的
//! JSON 毛病，最后还原数学跨度并整体解析。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// 数学占位符用私用区字符，正常文本中不会出现
const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// 行内数学跨度：`$...$` 或 `\(...\)`
static MATH_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[^$]+\$|\\\(.*?\\\)").unwrap());

static TRAILING_COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

static MISSING_COMMA_OBJ_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\}\s*\{").unwrap());

static MISSING_COMMA_ARR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\s*\[").unwrap());

/// 只为已知的字段名补引号，不碰任意裸标识符
static BARE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([{,]\s*)(question|prompt|stem|type|modality|choices|correct_answer|answer|explanation|analysis|difficulty|subject)(\s*:)",
    )
    .unwrap()
});

/// 策略二：结构性修复后整体解析
pub fn repair_parse(raw: &str) -> Option<Vec<Value>> {
    let text = super::strip_code_fence(raw);
    let repaired = repair_text(text);
    let value: Value = serde_json::from_str(repaired.trim()).ok()?;
    Some(super::collect_objects(value))
}

/// 应用固定顺序的文本修复序列
///
/// 1. 保护行内数学跨度
/// 2. 转义字符串字面量内部的裸换行/制表符，丢弃控制字符
/// 3. 为已知字段名补引号
/// 4. 去掉 `}` / `]` 前的尾随逗号
/// 5. 在相邻的 `}{` 与 `][` 之间补逗号
/// 6. 还原数学跨度
pub fn repair_text(text: &str) -> String {
    let (protected, spans) = protect_math_spans(text);
    let escaped = escape_string_interiors(&protected);
    let quoted = BARE_KEY_RE.replace_all(&escaped, "$1\"$2\"$3");
    let no_trailing = TRAILING_COMMA_RE.replace_all(&quoted, "$1");
    let with_obj_commas = MISSING_COMMA_OBJ_RE.replace_all(&no_trailing, "},{");
    let with_arr_commas = MISSING_COMMA_ARR_RE.replace_all(&with_obj_commas, "],[");
    restore_math_spans(&with_arr_commas, &spans)
}

fn protect_math_spans(text: &str) -> (String, Vec<String>) {
    let mut spans = Vec::new();
    let protected = MATH_INLINE_RE
        .replace_all(text, |caps: &regex::Captures| {
            let index = spans.len();
            spans.push(caps[0].to_string());
            format!("{}{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE)
        })
        .into_owned();
    (protected, spans)
}

/// 还原数学跨度
///
/// 跨度内容按原始 LaTeX 对待，放回 JSON 字符串字面量时重新做转义。
fn restore_math_spans(text: &str, spans: &[String]) -> String {
    let mut out = text.to_string();
    for (index, span) in spans.iter().enumerate() {
        let placeholder = format!("{}{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE);
        let escaped = span
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n");
        out = out.replace(&placeholder, &escaped);
    }
    out
}

/// 逐字符扫描，跟踪字符串与转义状态
///
/// 字符串内部：裸换行转义为 `\n`，制表符转义为 `\t`，其余控制字符丢弃。
/// 字符串外部：仅丢弃换行和制表符之外的控制字符。
fn escape_string_interiors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                '"' => {
                    out.push(c);
                    in_string = false;
                }
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => {}
                c if c.is_control() => {}
                c => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    out.push(c);
                    in_string = true;
                }
                '\n' | '\t' => out.push(c),
                c if c.is_control() => {}
                c => out.push(c),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_comma_removed() {
        let fixed = repair_text(r#"{"question": "q", "correct_answer": "a",}"#);
        assert!(serde_json::from_str::<Value>(&fixed).is_ok());
    }

    #[test]
    fn test_raw_newline_in_string_escaped() {
        let fixed = repair_text("{\"question\": \"第一行\n第二行\"}");
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["question"].as_str().unwrap(), "第一行\n第二行");
    }

    #[test]
    fn test_bare_known_keys_quoted() {
        let fixed = repair_text(r#"{question: "q", correct_answer: "a"}"#);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["question"].as_str().unwrap(), "q");
        assert_eq!(value["correct_answer"].as_str().unwrap(), "a");
    }

    #[test]
    fn test_missing_comma_between_objects_inserted() {
        let fixed = repair_text(r#"[{"question": "q1", "correct_answer": "a"} {"question": "q2", "correct_answer": "b"}]"#);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_math_span_survives_repair() {
        // $...$ 里的花括号和反斜杠不能被修复正则碰坏
        let raw = "{\"question\": \"计算 $\\frac{1}{2} + \\frac{1}{3}$ 的值\", \"correct_answer\": \"5/6\",}";
        let fixed = repair_text(raw);
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert!(value["question"].as_str().unwrap().contains("\\frac{1}{2}"));
    }

    #[test]
    fn test_control_characters_stripped() {
        let fixed = repair_text("{\"question\": \"ab\u{0007}c\", \"correct_answer\": \"a\"}");
        let value: Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["question"].as_str().unwrap(), "abc");
    }
}
