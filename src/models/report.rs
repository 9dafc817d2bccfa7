use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::category::CategoryLabel;
use crate::models::record::EnrichedRecord;

/// 汇总报告
///
/// 在一次运行结束时构建一次，之后不再修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub total_collected: usize,
    pub per_category: BTreeMap<CategoryLabel, Vec<EnrichedRecord>>,
    pub all_records: Vec<EnrichedRecord>,
    /// 运行被致命错误打断时为 true
    #[serde(default)]
    pub partial: bool,
}

impl AggregateReport {
    /// 某个分类下的记录数
    pub fn count(&self, label: &CategoryLabel) -> usize {
        self.per_category.get(label).map_or(0, Vec::len)
    }

    /// 各分类计数
    pub fn summary(&self) -> Vec<(CategoryLabel, usize)> {
        self.per_category
            .iter()
            .map(|(label, records)| (label.clone(), records.len()))
            .collect()
    }
}
