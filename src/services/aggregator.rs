//! 汇总服务 - 业务能力层

use std::collections::BTreeMap;

use chrono::Utc;

use crate::models::{AggregateReport, EnrichedRecord};

/// 汇总器
pub struct Aggregator;

impl Aggregator {
    /// 单次遍历：按记录自身的标签放入各分类，并追加到总列表
    ///
    /// 记录顺序与输入一致；同一输入与规则下结果确定（时间戳除外）。
    pub fn aggregate(records: Vec<EnrichedRecord>, partial: bool) -> AggregateReport {
        let mut per_category: BTreeMap<_, Vec<EnrichedRecord>> = BTreeMap::new();
        for record in &records {
            for label in &record.categories {
                per_category
                    .entry(label.clone())
                    .or_default()
                    .push(record.clone());
            }
        }

        AggregateReport {
            generated_at: Utc::now(),
            total_collected: records.len(),
            per_category,
            all_records: records,
            partial,
        }
    }
}
