/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 并行生成调用的工作单元上限
    pub max_workers: usize,
    /// 单个配额桶的评审重试上限
    pub max_retries: u32,
    /// 评审通过阈值（1-5 分制，所有评分项均需达到）
    pub judge_score_threshold: f64,
    /// 主观题判分及格阈值（0-100 分制）
    pub pass_score_threshold: f64,
    /// 生成请求 TOML 文件路径
    pub request_file: String,
    /// 题目输出 JSON 文件路径
    pub output_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 评审 / 判分配置 ---
    /// 评审凭证为空时评审降级为宽松模式
    pub judge_api_key: String,
    pub judge_model_name: String,
    pub scoring_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: 5,
            max_retries: 3,
            judge_score_threshold: 3.5,
            pass_score_threshold: 60.0,
            request_file: "request.toml".to_string(),
            output_file: "items.json".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            judge_api_key: String::new(),
            judge_model_name: "gpt-4o-mini".to_string(),
            scoring_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_workers: std::env::var("MAX_WORKERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_workers),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            judge_score_threshold: std::env::var("JUDGE_SCORE_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.judge_score_threshold),
            pass_score_threshold: std::env::var("PASS_SCORE_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pass_score_threshold),
            request_file: std::env::var("REQUEST_FILE").unwrap_or(default.request_file),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            judge_api_key: std::env::var("JUDGE_API_KEY").unwrap_or(default.judge_api_key),
            judge_model_name: std::env::var("JUDGE_MODEL_NAME").unwrap_or(default.judge_model_name),
            scoring_model_name: std::env::var("SCORING_MODEL_NAME").unwrap_or(default.scoring_model_name),
        }
    }
}
