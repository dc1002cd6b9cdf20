//! 提示词模板
//!
//! 模板的具体措辞不属于契约，调用方只依赖这里导出的构建函数。
//! 恢复器不假设模型遵守了这里的 JSON 格式要求。

use crate::models::item::GeneratedItem;

/// 生成调用的系统提示词
pub const GENERATION_SYSTEM: &str =
    "你是一名资深的教辅出题老师，严格按照要求输出 JSON 格式的题目列表，不输出任何额外说明。";

/// 评审调用的系统提示词
pub const JUDGE_SYSTEM: &str =
    "你是一名严格的教学质量评审员，按评分细则逐项打分，只输出 JSON，不输出任何额外说明。";

/// 主观题判分调用的系统提示词
pub const SCORING_SYSTEM: &str =
    "你是一名公正的阅卷老师，根据参考答案给学生作答打分，只输出 JSON，不输出任何额外说明。";

/// 构建生成提示词
///
/// # 参数
/// - `bucket_label`: 配额桶标签（科目/版块）
/// - `needed`: 本次需要的题目数量
/// - `distribution_hint`: 题型与难度分布说明（可为空）
/// - `feedback`: 上一轮评审的驳回反馈，从第二轮起追加
pub fn build_generation_prompt(
    bucket_label: &str,
    needed: usize,
    distribution_hint: &str,
    feedback: Option<&str>,
) -> String {
    let mut prompt = format!(
        r#"请为「{}」版块出题。

【数量】{}

【分布要求】
{}

【输出格式】
输出一个 JSON 数组，每道题目是一个对象，字段如下：
- "question": 题干文本（数学表达式用 $...$ 包裹的 LaTeX）
- "type": "objective"（客观题）或 "free_form"（主观题）
- "choices": 客观题的选项数组（主观题省略）
- "correct_answer": 标准答案（客观题填选项字母）
- "explanation": 解析
- "difficulty": 难度标签

只输出 JSON 数组本身。"#,
        bucket_label,
        needed,
        if distribution_hint.is_empty() {
            "无特殊要求"
        } else {
            distribution_hint
        },
    );

    if let Some(feedback) = feedback {
        prompt.push_str("\n\n【上一轮驳回反馈】以下问题必须避免：\n");
        prompt.push_str(feedback);
    }

    prompt
}

/// 构建评审提示词
///
/// 要求按四个评分项逐项打 1-5 分，输出
/// `{"scores": {...}, "verdict": "accept"|"reject", "feedback": "..."}`。
pub fn build_judge_prompt(item: &GeneratedItem) -> String {
    let choices = item
        .choices
        .as_ref()
        .map(|c| c.join(" / "))
        .unwrap_or_else(|| "（无选项）".to_string());

    format!(
        r#"请评审下面这道题目的质量。

题干：{}
选项：{}
答案：{}
解析：{}
难度：{}

【评分项】每项 1-5 分：
- accuracy: 题目与答案是否准确无误
- clarity: 题干表述是否清晰无歧义
- difficulty_fit: 难度是否与标注相符
- pedagogy: 是否有教学价值

【输出格式】
{{"scores": {{"accuracy": 5, "clarity": 5, "difficulty_fit": 5, "pedagogy": 5}}, "verdict": "accept", "feedback": "一句话说明"}}

只输出这个 JSON 对象。"#,
        item.prompt_text, choices, item.answer_key, item.explanation, item.difficulty_label
    )
}

/// 构建主观题判分提示词
///
/// 要求输出 `{"score": 0-100 的数字, "feedback": "..."}`。
pub fn build_scoring_prompt(question: &str, key: &str, student_answer: &str, context: &str) -> String {
    format!(
        r#"请为学生作答打分（0-100 的整数或小数）。

题目：{}
参考答案：{}
解析参考：{}
学生作答：{}

【输出格式】
{{"score": 85, "feedback": "一句话点评"}}

只输出这个 JSON 对象。"#,
        question, key, context, student_answer
    )
}

/// 把驳回反馈汇总为下一轮提示词的追加块
pub fn build_feedback_block(rejections: &[String]) -> String {
    rejections
        .iter()
        .enumerate()
        .map(|(i, feedback)| format!("{}. {}", i + 1, feedback))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_contains_count() {
        let prompt = build_generation_prompt("阅读", 5, "", None);
        assert!(prompt.contains("【数量】5"));
        assert!(prompt.contains("阅读"));
        assert!(!prompt.contains("驳回反馈"));
    }

    #[test]
    fn test_generation_prompt_appends_feedback_from_second_attempt() {
        let block = build_feedback_block(&["答案与解析矛盾".to_string(), "题干有歧义".to_string()]);
        let prompt = build_generation_prompt("语法", 2, "难度：中", Some(&block));
        assert!(prompt.contains("驳回反馈"));
        assert!(prompt.contains("1. 答案与解析矛盾"));
        assert!(prompt.contains("2. 题干有歧义"));
    }
}
