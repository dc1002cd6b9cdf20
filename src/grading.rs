//! 判分引擎
//!
//! 客观题走本地等价判定（原始一致 → 规范化一致），主观题在规范化
//! 短路失败后调用外部判分能力。判分调用失败降级为 0 分并附带诊断
//! 信息，不中止批次。返回的 [`GradingResult`] 不可变。

use tracing::{debug, warn};

use crate::clients::Scorer;
use crate::models::item::{GeneratedItem, GradingMethod, GradingResult, Modality};
use crate::normalize;

/// 判分引擎
pub struct GradingEngine<'a, S> {
    scorer: &'a S,
    /// 主观题及格阈值（0-100 分制）
    pass_score_threshold: f64,
}

impl<'a, S: Scorer> GradingEngine<'a, S> {
    pub fn new(scorer: &'a S, pass_score_threshold: f64) -> Self {
        Self {
            scorer,
            pass_score_threshold,
        }
    }

    /// 判定学生作答
    pub async fn grade(&self, item: &GeneratedItem, student_answer: &str) -> GradingResult {
        match item.modality {
            Modality::Objective => self.grade_objective(item, student_answer),
            Modality::FreeForm => self.grade_free_form(item, student_answer).await,
        }
    }

    /// 客观题：本地等价判定，不发起外部调用
    fn grade_objective(&self, item: &GeneratedItem, student_answer: &str) -> GradingResult {
        let normalized = normalize::normalize_answer(student_answer);

        // 原始字符串完全一致优先
        if student_answer == item.answer_key {
            return objective_result(item, student_answer, &normalized, true, GradingMethod::Exact);
        }

        let is_correct = objective_equivalent(&item.answer_key, student_answer);
        objective_result(
            item,
            student_answer,
            &normalized,
            is_correct,
            GradingMethod::Normalized,
        )
    }

    /// 主观题：规范化一致短路，否则交给外部判分能力
    async fn grade_free_form(&self, item: &GeneratedItem, student_answer: &str) -> GradingResult {
        let normalized = normalize::normalize_answer(student_answer);
        let normalized_key = normalize::normalize_answer(&item.answer_key);

        if !normalized.is_empty() && normalized == normalized_key {
            debug!("题目 {} 规范化一致，跳过外部判分", item.sequence_id);
            return GradingResult {
                item_ref: item.sequence_id,
                student_answer: student_answer.to_string(),
                normalized_student_answer: normalized,
                is_correct: true,
                score: 100.0,
                method: GradingMethod::Normalized,
                diagnostic: None,
            };
        }

        match self
            .scorer
            .score(
                &item.prompt_text,
                &item.answer_key,
                student_answer,
                &item.explanation,
            )
            .await
        {
            Ok(judged) => GradingResult {
                item_ref: item.sequence_id,
                student_answer: student_answer.to_string(),
                normalized_student_answer: normalized,
                is_correct: judged.score >= self.pass_score_threshold,
                score: judged.score,
                method: GradingMethod::Judged,
                diagnostic: if judged.feedback.is_empty() {
                    None
                } else {
                    Some(judged.feedback)
                },
            },
            Err(e) => {
                // 判分失败降级为 0 分，不中止批次
                warn!("⚠️ 题目 {} 判分调用失败: {}", item.sequence_id, e);
                GradingResult {
                    item_ref: item.sequence_id,
                    student_answer: student_answer.to_string(),
                    normalized_student_answer: normalized,
                    is_correct: false,
                    score: 0.0,
                    method: GradingMethod::Judged,
                    diagnostic: Some(format!("判分调用失败: {}", e)),
                }
            }
        }
    }
}

/// 客观题的规范化等价判定
///
/// 三条途径按序尝试：选项字母归一一致、规范化文本一致、
/// 数值序列非空且一致。
fn objective_equivalent(answer_key: &str, student_answer: &str) -> bool {
    if let (Some(key_choice), Some(student_choice)) = (
        normalize::canonical_choice(answer_key),
        normalize::canonical_choice(student_answer),
    ) {
        return key_choice == student_choice;
    }

    let normalized_key = normalize::normalize_answer(answer_key);
    let normalized_student = normalize::normalize_answer(student_answer);
    if !normalized_key.is_empty() && normalized_key == normalized_student {
        return true;
    }

    let key_numbers = normalize::numeric_sequence(&normalized_key);
    let student_numbers = normalize::numeric_sequence(&normalized_student);
    !key_numbers.is_empty() && key_numbers == student_numbers
}

fn objective_result(
    item: &GeneratedItem,
    student_answer: &str,
    normalized: &str,
    is_correct: bool,
    method: GradingMethod,
) -> GradingResult {
    GradingResult {
        item_ref: item.sequence_id,
        student_answer: student_answer.to_string(),
        normalized_student_answer: normalized.to_string(),
        is_correct,
        score: if is_correct { 100.0 } else { 0.0 },
        method,
        diagnostic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::JudgedScore;
    use crate::error::PipelineResult;

    /// 固定返回同一分数的判分桩
    struct FixedScorer {
        score: f64,
        fail: bool,
    }

    impl Scorer for FixedScorer {
        async fn score(
            &self,
            _question: &str,
            _key: &str,
            _student_answer: &str,
            _context: &str,
        ) -> PipelineResult<JudgedScore> {
            if self.fail {
                return Err(crate::error::PipelineError::Other("服务不可达".to_string()));
            }
            Ok(JudgedScore {
                score: self.score,
                feedback: "要点齐全".to_string(),
            })
        }
    }

    fn objective_item(answer_key: &str) -> GeneratedItem {
        GeneratedItem {
            sequence_id: 1,
            modality: Modality::Objective,
            prompt_text: "1+1=?".to_string(),
            choices: Some(vec!["1".to_string(), "2".to_string()]),
            answer_key: answer_key.to_string(),
            explanation: String::new(),
            difficulty_label: "易".to_string(),
            subject_label: "数学".to_string(),
        }
    }

    fn free_form_item(answer_key: &str) -> GeneratedItem {
        GeneratedItem {
            sequence_id: 2,
            modality: Modality::FreeForm,
            prompt_text: "请化简 14/2".to_string(),
            choices: None,
            answer_key: answer_key.to_string(),
            explanation: "除法".to_string(),
            difficulty_label: "易".to_string(),
            subject_label: "数学".to_string(),
        }
    }

    #[test]
    fn test_objective_exact_match() {
        let scorer = FixedScorer { score: 0.0, fail: false };
        let engine = GradingEngine::new(&scorer, 60.0);
        let result = tokio_test::block_on(engine.grade(&objective_item("B"), "B"));
        assert!(result.is_correct);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.method, GradingMethod::Exact);
    }

    #[test]
    fn test_objective_choice_mapping_both_directions() {
        let scorer = FixedScorer { score: 0.0, fail: false };
        let engine = GradingEngine::new(&scorer, 60.0);
        // 小写字母与标准答案的大写字母等价
        let result = tokio_test::block_on(engine.grade(&objective_item("B"), "b"));
        assert!(result.is_correct);
        assert_eq!(result.method, GradingMethod::Normalized);
        // 数字标记与字母标记双向互通：2 ↔ B
        let result = tokio_test::block_on(engine.grade(&objective_item("2"), "B"));
        assert!(result.is_correct);
        let result = tokio_test::block_on(engine.grade(&objective_item("B"), "2"));
        assert!(result.is_correct);
    }

    #[test]
    fn test_objective_choice_marker_normalized() {
        let scorer = FixedScorer { score: 0.0, fail: false };
        let engine = GradingEngine::new(&scorer, 60.0);
        // ② 与选项字母 B 归一为同一选项
        let result = tokio_test::block_on(engine.grade(&objective_item("B"), "②"));
        assert!(result.is_correct);
        assert_eq!(result.method, GradingMethod::Normalized);
    }

    #[test]
    fn test_objective_ocr_confusion_normalized() {
        let scorer = FixedScorer { score: 0.0, fail: false };
        let engine = GradingEngine::new(&scorer, 60.0);
        // OCR 把 1 认成了 l
        let result = tokio_test::block_on(engine.grade(&objective_item("12"), "l2"));
        assert!(result.is_correct);
    }

    #[test]
    fn test_objective_wrong_answer_scores_zero() {
        let scorer = FixedScorer { score: 0.0, fail: false };
        let engine = GradingEngine::new(&scorer, 60.0);
        let result = tokio_test::block_on(engine.grade(&objective_item("B"), "C"));
        assert!(!result.is_correct);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_free_form_normalized_short_circuit() {
        // 分数等价时不应走外部判分（桩会打 0 分暴露问题）
        let scorer = FixedScorer { score: 0.0, fail: false };
        let engine = GradingEngine::new(&scorer, 60.0);
        let result = tokio_test::block_on(engine.grade(&free_form_item("7/1"), "14/2"));
        assert!(result.is_correct);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.method, GradingMethod::Normalized);
    }

    #[test]
    fn test_free_form_judged_pass_and_fail() {
        let item = free_form_item("光能转化为化学能");

        let passing = FixedScorer { score: 85.0, fail: false };
        let engine = GradingEngine::new(&passing, 60.0);
        let result = tokio_test::block_on(engine.grade(&item, "把光能变成化学能储存"));
        assert!(result.is_correct);
        assert_eq!(result.score, 85.0);
        assert_eq!(result.method, GradingMethod::Judged);
        assert!(result.diagnostic.is_some());

        let failing = FixedScorer { score: 30.0, fail: false };
        let engine = GradingEngine::new(&failing, 60.0);
        let result = tokio_test::block_on(engine.grade(&item, "不知道"));
        assert!(!result.is_correct);
        assert_eq!(result.score, 30.0);
    }

    #[test]
    fn test_free_form_scorer_failure_degrades_to_zero() {
        let scorer = FixedScorer { score: 85.0, fail: true };
        let engine = GradingEngine::new(&scorer, 60.0);
        let item = free_form_item("光能转化为化学能");
        let result = tokio_test::block_on(engine.grade(&item, "作答"));
        assert!(!result.is_correct);
        assert_eq!(result.score, 0.0);
        assert!(result.diagnostic.as_deref().unwrap().contains("判分调用失败"));
    }
}
