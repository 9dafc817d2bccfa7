//! 去重服务 - 业务能力层
//!
//! 只负责"这个链接见过没有"，不关心流程

use std::collections::HashSet;

/// 去重器
///
/// 持有本次会话的已访问链接集合，集合只增不减，会话结束时随之丢弃。
/// `admit` 通过 `&mut self` 完成"检查并插入"，调用方持有唯一可变引用即保证原子性。
#[derive(Debug, Default)]
pub struct Deduplicator {
    visited: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 第一次见到的链接返回 true，之后返回 false；没有链接的记录总是放行
    pub fn admit(&mut self, link: Option<&str>) -> bool {
        match link {
            Some(link) => self.visited.insert(link.to_string()),
            None => true,
        }
    }

    /// 已记录的链接数量
    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}
