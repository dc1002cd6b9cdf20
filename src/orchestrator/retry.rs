//! 评审门控重试控制器
//!
//! 处理单个配额桶的生成-评审循环：每一轮只为缺口数量补发生成调用，
//! 从第二轮起把上一轮的驳回反馈追加进提示词。无论成功与否，每轮
//! 恰好消耗一次生成尝试，轮数到达上限即停，接受部分成功的结果。

use tracing::{debug, info, warn};

use crate::clients::{Generator, Judge};
use crate::error::PipelineResult;
use crate::models::item::{GeneratedItem, JudgeVerdict, QuotaBucket, Verdict};
use crate::prompt;
use crate::recovery;

/// 评审门控重试控制器
///
/// 无共享状态，每个配额桶的工作单元各自持有一个实例。
pub struct JudgeGatedRetryController<'a, G, J> {
    generator: &'a G,
    judge: &'a J,
    /// 评审通过阈值（1-5 分制）
    judge_score_threshold: f64,
    /// 重试轮数上限
    max_retries: u32,
}

impl<'a, G: Generator, J: Judge> JudgeGatedRetryController<'a, G, J> {
    pub fn new(generator: &'a G, judge: &'a J, judge_score_threshold: f64, max_retries: u32) -> Self {
        Self {
            generator,
            judge,
            judge_score_threshold,
            max_retries,
        }
    }

    /// 为一个配额桶生成并评审题目
    ///
    /// 返回的题目数量可能少于 `bucket.count`（部分成功），不会多于。
    /// 仅评审响应解析失败这类流水线致命错误向上传播，生成调用失败
    /// 和恢复耗尽只消耗当轮尝试。
    pub async fn fill_bucket(
        &self,
        bucket: &QuotaBucket,
        distribution_hint: &str,
    ) -> PipelineResult<Vec<GeneratedItem>> {
        let mut accepted: Vec<GeneratedItem> = Vec::new();
        let mut rejections: Vec<String> = Vec::new();

        if !self.judge.is_available() {
            info!("⚠️ [{}] 评审能力不可用，本桶降级为宽松模式", bucket.label);
        }

        let mut attempt = 0;
        while (accepted.len() as u32) < bucket.count && attempt < self.max_retries {
            attempt += 1;
            let needed = bucket.count as usize - accepted.len();
            debug!(
                "[{}] 第 {}/{} 轮: 还需 {} 道题目",
                bucket.label, attempt, self.max_retries, needed
            );

            let feedback_block = if attempt > 1 && !rejections.is_empty() {
                Some(prompt::build_feedback_block(&rejections))
            } else {
                None
            };
            let generation_prompt = prompt::build_generation_prompt(
                &bucket.label,
                needed,
                distribution_hint,
                feedback_block.as_deref(),
            );

            let raw = match self
                .generator
                .generate(&generation_prompt, Some(prompt::GENERATION_SYSTEM))
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("[{}] 第 {} 轮生成调用失败: {}", bucket.label, attempt, e);
                    continue;
                }
            };

            let items = match recovery::recover(&raw, needed).into_result(needed) {
                Ok(items) => items,
                Err(e) => {
                    warn!("[{}] 第 {} 轮: {}", bucket.label, attempt, e);
                    continue;
                }
            };

            // 本轮反馈只反映本轮的驳回
            rejections.clear();

            for mut item in items {
                // 超出配额的多余题目直接截断
                if accepted.len() as u32 >= bucket.count {
                    break;
                }
                item.subject_label = bucket.label.clone();

                let Some(verdict) = self.judge_item(&item).await? else {
                    // 宽松模式：评审缺席时不设门槛
                    accepted.push(item);
                    continue;
                };
                if verdict.verdict == Verdict::Accept && verdict.meets(self.judge_score_threshold) {
                    accepted.push(item);
                } else {
                    debug!("[{}] 题目被驳回: {}", bucket.label, item.preview());
                    rejections.push(rejection_note(&item, &verdict));
                }
            }
        }

        if (accepted.len() as u32) < bucket.count {
            warn!(
                "⚠️ [{}] 重试轮数耗尽，接受 {}/{} 道题目",
                bucket.label,
                accepted.len(),
                bucket.count
            );
        } else {
            info!("✓ [{}] 配额已满足: {} 道题目", bucket.label, accepted.len());
        }

        Ok(accepted)
    }

    /// 评审单个题目
    ///
    /// 评审不可用（无凭证或服务不可达）时返回 `None`，表示本题走
    /// 宽松模式通过；评审响应解析失败向上传播，中止流水线。
    async fn judge_item(&self, item: &GeneratedItem) -> PipelineResult<Option<JudgeVerdict>> {
        if !self.judge.is_available() {
            return Ok(None);
        }
        match self.judge.judge(item).await {
            Ok(verdict) => Ok(Some(verdict)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("⚠️ 评审降级为宽松模式: {}", e);
                Ok(None)
            }
        }
    }
}

/// 把驳回结论整理为下一轮提示词用的一条反馈
fn rejection_note(item: &GeneratedItem, verdict: &JudgeVerdict) -> String {
    if verdict.feedback.trim().is_empty() {
        format!("题目「{}」未达到质量要求", item.preview())
    } else {
        format!("题目「{}」被驳回: {}", item.preview(), verdict.feedback)
    }
}
