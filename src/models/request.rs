use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::models::item::BucketSpec;

/// 生成请求
///
/// 三个配额轴（科目/题型/难度）相互独立，各自的百分比之和均需为 100；
/// 轴与轴之间不做交叉约束。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// 请求的题目总数
    pub total: u32,
    /// 科目配额（生成调用按此轴分桶）
    pub subjects: Vec<BucketSpec>,
    /// 题型配额（作为提示词中的分布说明）
    #[serde(default)]
    pub formats: Vec<BucketSpec>,
    /// 难度配额（作为提示词中的分布说明）
    #[serde(default)]
    pub difficulties: Vec<BucketSpec>,
}

/// 从 TOML 文件加载生成请求
pub async fn load_request(path: &Path) -> Result<GenerationRequest> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取请求文件: {}", path.display()))?;

    let request: GenerationRequest = toml::from_str(&content)
        .with_context(|| format!("无法解析请求文件: {}", path.display()))?;

    tracing::info!(
        "已加载生成请求: 共 {} 道题目, {} 个科目配额桶",
        request.total,
        request.subjects.len()
    );

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_toml() {
        let content = r#"
total = 10

[[subjects]]
label = "阅读"
percentage = 60

[[subjects]]
label = "语法"
percentage = 40

[[difficulties]]
label = "中"
percentage = 100
"#;
        let request: GenerationRequest = toml::from_str(content).unwrap();
        assert_eq!(request.total, 10);
        assert_eq!(request.subjects.len(), 2);
        assert_eq!(request.subjects[0].label, "阅读");
        assert_eq!(request.subjects[1].percentage, 40);
        assert_eq!(request.difficulties.len(), 1);
        assert!(request.formats.is_empty());
    }
}
