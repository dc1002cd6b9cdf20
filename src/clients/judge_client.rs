//! 评审与判分客户端
//!
//! 在 [`LlmClient`] 之上解析结构化评分返回。评审凭证缺失时客户端
//! 处于不可用状态，由重试控制器整批降级为宽松模式；评审有响应但
//! 解析不出来属于流水线致命错误，静默放行有放出劣质内容的风险。

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use crate::clients::capabilities::{Judge, JudgedScore, Scorer};
use crate::clients::llm_client::LlmClient;
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::models::item::{GeneratedItem, JudgeVerdict, Verdict};
use crate::prompt;
use crate::recovery;

/// 评审响应的线上格式
#[derive(Debug, Deserialize)]
struct JudgeRaw {
    scores: BTreeMap<String, f64>,
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    feedback: Option<String>,
}

/// 判分响应的线上格式
#[derive(Debug, Deserialize)]
struct ScoreRaw {
    score: f64,
    #[serde(default)]
    feedback: Option<String>,
}

/// 评审客户端
pub struct JudgeClient {
    /// 凭证缺失时为 `None`
    client: Option<LlmClient>,
}

impl JudgeClient {
    pub fn new(config: &Config) -> Self {
        let client = if config.judge_api_key.trim().is_empty() {
            None
        } else {
            Some(LlmClient::from_parts(
                &config.judge_api_key,
                &config.llm_api_base_url,
                config.judge_model_name.clone(),
            ))
        };
        Self { client }
    }

    /// 解析评审返回的 JSON
    fn parse_verdict(item_ref: u32, response: &str) -> PipelineResult<JudgeVerdict> {
        let text = recovery::strip_code_fence(response);
        let raw: JudgeRaw = serde_json::from_str(text)
            .map_err(|e| PipelineError::judge_malformed(response, e))?;

        let verdict = match raw.verdict.as_deref() {
            Some("reject") | Some("驳回") => Verdict::Reject,
            _ => Verdict::Accept,
        };

        Ok(JudgeVerdict {
            item_ref,
            scores: raw.scores,
            verdict,
            feedback: raw.feedback.unwrap_or_default(),
        })
    }
}

impl Judge for JudgeClient {
    async fn judge(&self, item: &GeneratedItem) -> PipelineResult<JudgeVerdict> {
        let Some(client) = &self.client else {
            return Err(PipelineError::judge_unavailable("未配置评审凭证"));
        };

        let response = client
            .chat(&prompt::build_judge_prompt(item), Some(prompt::JUDGE_SYSTEM))
            .await
            .map_err(|e| PipelineError::judge_unavailable(e.to_string()))?;

        debug!("评审响应: {}", response);
        Self::parse_verdict(item.sequence_id, &response)
    }

    fn is_available(&self) -> bool {
        self.client.is_some()
    }
}

/// 主观题判分客户端
pub struct ScoringClient {
    client: LlmClient,
}

impl ScoringClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: LlmClient::from_parts(
                &config.llm_api_key,
                &config.llm_api_base_url,
                config.scoring_model_name.clone(),
            ),
        }
    }

    fn parse_score(response: &str) -> PipelineResult<JudgedScore> {
        let text = recovery::strip_code_fence(response);
        let raw: ScoreRaw = serde_json::from_str(text).map_err(|_| {
            PipelineError::Grading(crate::error::GradingError::MalformedScore {
                response: response.to_string(),
            })
        })?;

        Ok(JudgedScore {
            score: raw.score.clamp(0.0, 100.0),
            feedback: raw.feedback.unwrap_or_default(),
        })
    }
}

impl Scorer for ScoringClient {
    async fn score(
        &self,
        question: &str,
        key: &str,
        student_answer: &str,
        context: &str,
    ) -> PipelineResult<JudgedScore> {
        let response = self
            .client
            .chat(
                &prompt::build_scoring_prompt(question, key, student_answer, context),
                Some(prompt::SCORING_SYSTEM),
            )
            .await
            .map_err(|e| {
                PipelineError::Grading(crate::error::GradingError::ScoringCallFailed {
                    source: e.into(),
                })
            })?;

        debug!("判分响应: {}", response);
        Self::parse_score(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JudgeError;

    #[test]
    fn test_parse_verdict_accept() {
        let response = r#"{"scores": {"accuracy": 4.0, "clarity": 5.0}, "verdict": "accept", "feedback": "不错"}"#;
        let verdict = JudgeClient::parse_verdict(1, response).unwrap();
        assert_eq!(verdict.verdict, Verdict::Accept);
        assert!(verdict.meets(3.5));
        assert_eq!(verdict.feedback, "不错");
    }

    #[test]
    fn test_parse_verdict_below_threshold() {
        let response = r#"{"scores": {"accuracy": 5.0, "clarity": 3.0}, "verdict": "reject", "feedback": "表述含糊"}"#;
        let verdict = JudgeClient::parse_verdict(1, response).unwrap();
        // 任一评分项低于阈值即不通过
        assert!(!verdict.meets(3.5));
    }

    #[test]
    fn test_parse_verdict_with_code_fence() {
        let response = "```json\n{\"scores\": {\"accuracy\": 4.0}, \"verdict\": \"accept\", \"feedback\": \"\"}\n```";
        assert!(JudgeClient::parse_verdict(1, response).is_ok());
    }

    #[test]
    fn test_malformed_verdict_is_fatal() {
        let err = JudgeClient::parse_verdict(1, "今天天气不错").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Judge(JudgeError::MalformedResponse { .. })
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_score_clamped() {
        let score = ScoringClient::parse_score(r#"{"score": 120, "feedback": "满分"}"#).unwrap();
        assert_eq!(score.score, 100.0);
    }

    #[test]
    fn test_parse_score_malformed() {
        assert!(ScoringClient::parse_score("不是JSON").is_err());
    }
}
