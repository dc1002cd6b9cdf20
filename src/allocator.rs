//! 配额分配器
//!
//! 把一组带百分比的配额桶转换为精确求和的整数题目数量。
//! 纯函数，无共享状态，多个工作单元可并发调用。

use crate::error::{PipelineError, PipelineResult};
use crate::models::item::{BucketSpec, QuotaBucket};

/// 按百分比分配题目数量
///
/// 每个桶先取 `floor(total * percentage / 100)`，向下取整产生的余数
/// 全部补给百分比最大的桶（并列时取靠前者）。由此保证对任意输入顺序
/// `sum(count) == total`，且 0% 的桶永远不会意外吞掉余数。
///
/// # 参数
/// - `total`: 请求的题目总数（0 合法，所有桶分到 0）
/// - `specs`: 配额桶列表，百分比之和必须为 100
///
/// # 返回
/// 按输入顺序返回带 `count` 的配额桶
pub fn allocate(total: u32, specs: &[BucketSpec]) -> PipelineResult<Vec<QuotaBucket>> {
    if specs.is_empty() {
        return Err(PipelineError::invalid_quota("配额桶列表不能为空"));
    }

    let sum: u32 = specs.iter().map(|b| b.percentage).sum();
    if sum != 100 {
        return Err(PipelineError::invalid_quota(format!(
            "百分比之和必须为 100，实际为 {}",
            sum
        )));
    }

    let mut counts: Vec<u32> = specs
        .iter()
        .map(|b| (total as u64 * b.percentage as u64 / 100) as u32)
        .collect();

    let assigned: u32 = counts.iter().sum();
    let remainder = total - assigned;
    if remainder > 0 {
        let mut idx = 0;
        for (i, spec) in specs.iter().enumerate() {
            if spec.percentage > specs[idx].percentage {
                idx = i;
            }
        }
        counts[idx] += remainder;
    }

    Ok(specs
        .iter()
        .zip(counts)
        .map(|(spec, count)| QuotaBucket {
            label: spec.label.clone(),
            percentage: spec.percentage,
            count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(pairs: &[(&str, u32)]) -> Vec<BucketSpec> {
        pairs
            .iter()
            .map(|(label, pct)| BucketSpec::new(*label, *pct))
            .collect()
    }

    #[test]
    fn test_example_allocation() {
        // total=10, [30,40,30] → [3,4,3]
        let buckets = allocate(10, &specs(&[("A", 30), ("B", 40), ("C", 30)])).unwrap();
        let counts: Vec<u32> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 4, 3]);
        assert_eq!(buckets[0].label, "A");
    }

    #[test]
    fn test_sum_invariant() {
        let cases: Vec<Vec<(&str, u32)>> = vec![
            vec![("a", 33), ("b", 33), ("c", 34)],
            vec![("x", 1), ("y", 99)],
            vec![("单桶", 100)],
            vec![("a", 17), ("b", 23), ("c", 29), ("d", 31)],
        ];
        for case in &cases {
            for total in [0u32, 1, 7, 10, 13, 100, 101, 997] {
                let buckets = allocate(total, &specs(case)).unwrap();
                let sum: u32 = buckets.iter().map(|b| b.count).sum();
                assert_eq!(sum, total, "total={} case={:?}", total, case);
            }
        }
    }

    #[test]
    fn test_total_zero() {
        let buckets = allocate(0, &specs(&[("A", 50), ("B", 50)])).unwrap();
        assert!(buckets.iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_zero_percentage_bucket_never_absorbs_remainder() {
        // 0% 的桶排在最后也不会吞掉余数，余数归百分比最大的桶
        let buckets = allocate(7, &specs(&[("A", 60), ("B", 40), ("C", 0)])).unwrap();
        assert_eq!(buckets[2].count, 0);
        assert_eq!(buckets[0].count, 5); // floor(4.2)=4 + 余数 1
        assert_eq!(buckets[1].count, 2);
    }

    #[test]
    fn test_invalid_percentage_sum() {
        let err = allocate(10, &specs(&[("A", 50), ("B", 40)])).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_empty_buckets() {
        assert!(allocate(10, &[]).is_err());
    }
}
