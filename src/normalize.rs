//! 文本规范化工具
//!
//! 判分引擎与恢复器共用的纯函数：分数写法归一、OCR 字符混淆修正、
//! 选项标记归一、LaTeX 数学命令修复、空白与控制字符清理。
//! 无共享可变状态，可被多个工作单元并发调用。

use std::sync::LazyLock;

use regex::Regex;

/// OCR 常见单字符混淆表
///
/// 大小写都收录：规范化流程先做大小写折叠，修正发生在折叠之后。
static OCR_CONFUSIONS: phf::Map<char, char> = phf::phf_map! {
    'l' => '1',
    'I' => '1',
    'i' => '1',
    'O' => '0',
    'o' => '0',
    'S' => '5',
    's' => '5',
};

/// 选项标记归一表：圈号数字 / 普通数字 / 字母 → 统一字母
static CHOICE_MARKERS: phf::Map<char, char> = phf::phf_map! {
    '①' => 'A', '②' => 'B', '③' => 'C', '④' => 'D', '⑤' => 'E',
    '⑥' => 'F', '⑦' => 'G', '⑧' => 'H', '⑨' => 'I', '⑩' => 'J',
    '1' => 'A', '2' => 'B', '3' => 'C', '4' => 'D', '5' => 'E',
    '6' => 'F', '7' => 'G', '8' => 'H', '9' => 'I',
    'a' => 'A', 'b' => 'B', 'c' => 'C', 'd' => 'D', 'e' => 'E',
    'f' => 'F', 'g' => 'G', 'h' => 'H', 'i' => 'I', 'j' => 'J',
    'A' => 'A', 'B' => 'B', 'C' => 'C', 'D' => 'D', 'E' => 'E',
    'F' => 'F', 'G' => 'G', 'H' => 'H', 'I' => 'I', 'J' => 'J',
};

/// 需要反斜杠前缀的数学命令名
const MATH_COMMANDS: &[&str] = &[
    "frac", "sqrt", "times", "div", "cdot", "leq", "geq", "neq", "pm", "pi", "alpha", "beta",
    "theta", "angle", "triangle", "overline", "sum", "int", "infty", "cup", "cap", "subset",
    "perp", "sim", "equiv",
];

static FRACTION_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+)\s*/\s*(\d+)\s*$").unwrap());

/// 分母在前的自然语言写法（"2분의14" / "2分之14" 均表示 14/2）
static FRACTION_DENOM_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*(?:분의|分之)\s*(-?\d+)\s*$").unwrap());

/// OCR 经常丢失斜杠，只剩两个空白分隔的数字
static FRACTION_SPACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+)\s+(\d+)\s*$").unwrap());

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

static BARE_COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(^|[^\\a-zA-Z])({})\b", MATH_COMMANDS.join("|"))).unwrap()
});

static MATH_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[a-zA-Z]+(?:\{[^{}]*\})*").unwrap());

static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// 规范化答案字符串
///
/// 流程：
/// 1. 去首尾空白并做大小写折叠
/// 2. 检测三种分数写法（`a/b`、分母在前的自然语言写法、空白分隔的两个数字），
///    命中则用 GCD 约分后统一为 `分子/分母`
/// 3. 去掉内部空白
/// 4. 非纯数字形态时试探性应用 OCR 混淆表，仅当替换结果呈纯数字形态才采纳，
///    避免破坏本来就干净的文字答案
pub fn normalize_answer(s: &str) -> String {
    let folded = s.trim().to_lowercase();
    if let Some(fraction) = canonicalize_fraction(&folded) {
        return fraction;
    }

    let compact: String = folded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || is_numeric_symbolic(&compact) {
        return compact;
    }

    let mapped: String = compact
        .chars()
        .map(|c| *OCR_CONFUSIONS.get(&c).unwrap_or(&c))
        .collect();
    if mapped != compact {
        if let Some(fraction) = canonicalize_fraction(&mapped) {
            return fraction;
        }
        if is_numeric_symbolic(&mapped) {
            return mapped;
        }
    }

    compact
}

/// 识别三种分数写法并约分为 `分子/分母`
pub fn canonicalize_fraction(s: &str) -> Option<String> {
    let (numerator, denominator) = if let Some(caps) = FRACTION_SLASH.captures(s) {
        (caps[1].parse::<i64>().ok()?, caps[2].parse::<i64>().ok()?)
    } else if let Some(caps) = FRACTION_DENOM_FIRST.captures(s) {
        // 分母在前
        (caps[2].parse::<i64>().ok()?, caps[1].parse::<i64>().ok()?)
    } else if let Some(caps) = FRACTION_SPACED.captures(s) {
        (caps[1].parse::<i64>().ok()?, caps[2].parse::<i64>().ok()?)
    } else {
        return None;
    };

    if denominator == 0 {
        return Some(format!("{}/{}", numerator, denominator));
    }

    let g = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()).max(1);
    Some(format!(
        "{}/{}",
        numerator / g as i64,
        denominator / g as i64
    ))
}

/// 按出现顺序提取全部数字子串
///
/// 非分数的数字型答案用数字序列比较而不是比较原始字符串，
/// 多余的文字和标点不会造成误判。
pub fn numeric_sequence(s: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(s)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// 选项标记归一
///
/// 圈号数字（①②…）、普通数字、大小写字母映射到统一的字母表 `A`、`B`…。
/// 输入须是去掉括号/句点/空白后的单个字符，否则返回 `None`。
pub fn canonical_choice(s: &str) -> Option<char> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '（' | '）' | '.' | '、' | ' '))
        .collect();
    let mut chars = cleaned.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    CHOICE_MARKERS.get(&first).copied()
}

/// 修复 LaTeX 数学命令
///
/// 已知命令名缺少反斜杠时补上；文本中出现数学命令但没有任何 `$`
/// 包裹时，给每段命令串包上行内数学定界符。
pub fn repair_latex(s: &str) -> String {
    let repaired = BARE_COMMAND_RE.replace_all(s, "${1}\\$2").into_owned();

    if !repaired.contains('$') && MATH_SPAN_RE.is_match(&repaired) {
        return MATH_SPAN_RE
            .replace_all(&repaired, |caps: &regex::Captures| {
                format!("${}$", &caps[0])
            })
            .into_owned();
    }

    repaired
}

/// 清理控制字符并收拢多余空白（仅用于评审通过前的文本修饰）
pub fn clean_text(s: &str) -> String {
    let filtered: String = s.chars().filter(|c| !c.is_control() || *c == '\n').collect();
    MULTI_SPACE_RE.replace_all(filtered.trim(), " ").into_owned()
}

/// 字符串是否已是纯数字/符号形态（此时跳过 OCR 修正以免弄脏干净答案）
fn is_numeric_symbolic(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '/' | '-' | '+' | '%' | ':' | '°'))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_three_shapes_canonicalize_identically() {
        // 三种写法都应约分为 7/1
        assert_eq!(normalize_answer("14/2"), "7/1");
        assert_eq!(normalize_answer("14 2"), "7/1");
        assert_eq!(normalize_answer("2분의14"), "7/1");
        assert_eq!(normalize_answer("2分之14"), "7/1");
    }

    #[test]
    fn test_fraction_reduction() {
        assert_eq!(normalize_answer("6/8"), "3/4");
        assert_eq!(normalize_answer("-6/8"), "-3/4");
        assert_eq!(normalize_answer(" 10 / 5 "), "2/1");
    }

    #[test]
    fn test_fraction_zero_denominator_left_alone() {
        assert_eq!(normalize_answer("3/0"), "3/0");
    }

    #[test]
    fn test_plain_numeric_untouched() {
        assert_eq!(normalize_answer("3.5"), "3.5");
        assert_eq!(normalize_answer("  42 "), "42");
    }

    #[test]
    fn test_ocr_confusion_applied_only_when_result_numeric() {
        assert_eq!(normalize_answer("1l4"), "114");
        assert_eq!(normalize_answer("O"), "0");
        assert_eq!(normalize_answer("S2"), "52");
        // 普通文字不会被弄脏
        assert_eq!(normalize_answer("apple"), "apple");
    }

    #[test]
    fn test_ocr_confusion_can_reveal_fraction() {
        // "l4/2" → "14/2" → 约分
        assert_eq!(normalize_answer("l4/2"), "7/1");
    }

    #[test]
    fn test_case_fold() {
        assert_eq!(normalize_answer("Apple"), "apple");
    }

    #[test]
    fn test_numeric_sequence() {
        assert_eq!(numeric_sequence("答案是 3 和 4.5"), vec![3.0, 4.5]);
        assert_eq!(numeric_sequence("x = -2"), vec![-2.0]);
        assert!(numeric_sequence("没有数字").is_empty());
    }

    #[test]
    fn test_canonical_choice_all_marker_families() {
        assert_eq!(canonical_choice("②"), Some('B'));
        assert_eq!(canonical_choice("2"), Some('B'));
        assert_eq!(canonical_choice("b"), Some('B'));
        assert_eq!(canonical_choice("B"), Some('B'));
        assert_eq!(canonical_choice("(3)"), Some('C'));
        assert_eq!(canonical_choice("D."), Some('D'));
        assert_eq!(canonical_choice("AB"), None);
        assert_eq!(canonical_choice(""), None);
    }

    #[test]
    fn test_repair_latex_adds_backslash() {
        assert_eq!(repair_latex(r"$frac{1}{2}$"), r"$\frac{1}{2}$");
        // 已有反斜杠的命令不会被重复加前缀
        assert_eq!(repair_latex(r"$\frac{1}{2}$"), r"$\frac{1}{2}$");
    }

    #[test]
    fn test_repair_latex_wraps_inline_math() {
        assert_eq!(repair_latex(r"frac{1}{2}"), r"$\frac{1}{2}$");
        let out = repair_latex(r"计算 sqrt{16} 的值");
        assert_eq!(out, r"计算 $\sqrt{16}$ 的值");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("a\u{0007}b"), "ab");
        assert_eq!(clean_text("  多   个  空格  "), "多 个 空格");
    }
}
