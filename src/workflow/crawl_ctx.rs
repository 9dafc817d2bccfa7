//! 会话上下文
//!
//! 封装"这一次搜索会话"独占的可变状态：已访问链接集合和已收集的记录

use std::fmt::Display;

use crate::models::{EnrichedRecord, SearchSession};
use crate::services::Deduplicator;

/// 会话上下文
///
/// 显式传入各个流程步骤，不使用全局状态；会话结束时连同去重集合一起丢弃。
#[derive(Debug)]
pub struct CrawlCtx {
    pub session: SearchSession,
    dedup: Deduplicator,
    records: Vec<EnrichedRecord>,
    /// 因重复而跳过的记录数
    pub duplicates_skipped: usize,
    /// 被过滤条件排除的记录数
    pub filtered_out: usize,
}

impl CrawlCtx {
    pub fn new(session: SearchSession) -> Self {
        Self {
            session,
            dedup: Deduplicator::new(),
            records: Vec::new(),
            duplicates_skipped: 0,
            filtered_out: 0,
        }
    }

    /// 去重检查的唯一入口
    pub fn admit(&mut self, link: Option<&str>) -> bool {
        let admitted = self.dedup.admit(link);
        if !admitted {
            self.duplicates_skipped += 1;
        }
        admitted
    }

    /// 追加一条已处理的记录，并写入来源信息
    pub fn push(&mut self, mut record: EnrichedRecord, page_index: u32) {
        record.search_keyword = self.session.keyword.clone();
        record.search_location = self.session.location_filter.clone();
        record.page_index = page_index;
        self.records.push(record);
    }

    pub fn into_records(self) -> Vec<EnrichedRecord> {
        self.records
    }
}

impl Display for CrawlCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} 已收集 {} 条，跳过重复 {} 条",
            self.session,
            self.records.len(),
            self.duplicates_skipped
        )
    }
}
