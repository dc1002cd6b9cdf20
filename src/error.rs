use std::fmt;

/// 流水线错误类型
#[derive(Debug)]
pub enum PipelineError {
    /// 配额配置错误
    Config(ConfigError),
    /// 结构化恢复错误
    Recovery(RecoveryError),
    /// 评审服务错误
    Judge(JudgeError),
    /// 判分服务错误
    Grading(GradingError),
    /// LLM 服务错误
    Llm(LlmError),
    /// 文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "配置错误: {}", e),
            PipelineError::Recovery(e) => write!(f, "恢复错误: {}", e),
            PipelineError::Judge(e) => write!(f, "评审错误: {}", e),
            PipelineError::Grading(e) => write!(f, "判分错误: {}", e),
            PipelineError::Llm(e) => write!(f, "LLM错误: {}", e),
            PipelineError::File(e) => write!(f, "文件错误: {}", e),
            PipelineError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(e) => Some(e),
            PipelineError::Recovery(e) => Some(e),
            PipelineError::Judge(e) => Some(e),
            PipelineError::Grading(e) => Some(e),
            PipelineError::Llm(e) => Some(e),
            PipelineError::File(e) => Some(e),
            PipelineError::Other(_) => None,
        }
    }
}

/// 配额配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配额桶校验失败（百分比之和不为 100 等）
    InvalidQuota {
        reason: String,
    },
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidQuota { reason } => {
                write!(f, "配额配置无效: {}", reason)
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 结构化恢复错误
#[derive(Debug)]
pub enum RecoveryError {
    /// 所有恢复策略均未能提取出可用题目
    Exhausted { expected: usize, reason: String },
}

impl fmt::Display for RecoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryError::Exhausted { expected, reason } => {
                write!(
                    f,
                    "恢复策略全部失败，期望 {} 道题目但一无所获: {}",
                    expected, reason
                )
            }
        }
    }
}

impl std::error::Error for RecoveryError {}

/// 评审服务错误
#[derive(Debug)]
pub enum JudgeError {
    /// 评审能力不可用（无凭证或服务不可达），上层应降级为宽松模式
    Unavailable {
        reason: String,
    },
    /// 评审服务返回了无法解析的内容，属于流水线致命错误
    MalformedResponse {
        response: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for JudgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgeError::Unavailable { reason } => {
                write!(f, "评审服务不可用: {}", reason)
            }
            JudgeError::MalformedResponse { response, source } => {
                write!(f, "评审响应无法解析 (响应: {}): {}", response, source)
            }
        }
    }
}

impl std::error::Error for JudgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JudgeError::MalformedResponse { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 判分服务错误
#[derive(Debug)]
pub enum GradingError {
    /// 主观题判分调用失败
    ScoringCallFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 判分服务返回的分数无法解析
    MalformedScore { response: String },
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::ScoringCallFailed { source } => {
                write!(f, "判分调用失败: {}", source)
            }
            GradingError::MalformedScore { response } => {
                write!(f, "判分响应无法解析: {}", response)
            }
        }
    }
}

impl std::error::Error for GradingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GradingError::ScoringCallFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    EmptyContent { model: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM API调用失败 (模型: {}): {}", model, source)
            }
            LlmError::EmptyContent { model } => {
                write!(f, "LLM返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<PipelineError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl PipelineError {
    /// 创建配额配置错误
    pub fn invalid_quota(reason: impl Into<String>) -> Self {
        PipelineError::Config(ConfigError::InvalidQuota {
            reason: reason.into(),
        })
    }

    /// 创建恢复耗尽错误
    pub fn recovery_exhausted(expected: usize, reason: impl Into<String>) -> Self {
        PipelineError::Recovery(RecoveryError::Exhausted {
            expected,
            reason: reason.into(),
        })
    }

    /// 创建评审不可用错误
    pub fn judge_unavailable(reason: impl Into<String>) -> Self {
        PipelineError::Judge(JudgeError::Unavailable {
            reason: reason.into(),
        })
    }

    /// 创建评审响应解析错误
    pub fn judge_malformed(
        response: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipelineError::Judge(JudgeError::MalformedResponse {
            response: response.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipelineError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 是否属于流水线致命错误
    ///
    /// 仅配额配置错误和评审响应解析错误会中止整个流水线，
    /// 其余错误只影响所在的配额桶或单个题目。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Config(_) | PipelineError::Judge(JudgeError::MalformedResponse { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 流水线结果类型
pub type PipelineResult<T> = Result<T, PipelineError>;
