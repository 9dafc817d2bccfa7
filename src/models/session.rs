use serde::{Deserialize, Serialize};

/// 一次搜索会话
///
/// 由调用方创建，整个爬取过程中保持不变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSession {
    /// 搜索关键词
    pub keyword: String,
    /// 地点过滤
    #[serde(alias = "location")]
    pub location_filter: String,
    /// 最多爬取的页数
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    5
}

impl SearchSession {
    pub fn new(keyword: impl Into<String>, location_filter: impl Into<String>, max_pages: u32) -> Self {
        Self {
            keyword: keyword.into(),
            location_filter: location_filter.into(),
            max_pages,
        }
    }
}

impl std::fmt::Display for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[\"{}\" @ {} 最多{}页]",
            self.keyword, self.location_filter, self.max_pages
        )
    }
}

/// 爬取计划：按顺序执行的多个搜索会话
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlPlan {
    #[serde(default, rename = "session")]
    pub sessions: Vec<SearchSession>,
}

impl CrawlPlan {
    /// 关键词 × 地点 展开成会话列表
    pub fn cross(keywords: &[&str], locations: &[&str], max_pages: u32) -> Self {
        let sessions = locations
            .iter()
            .flat_map(|loc| {
                keywords
                    .iter()
                    .map(move |kw| SearchSession::new(*kw, *loc, max_pages))
            })
            .collect();
        Self { sessions }
    }

    pub fn single(session: SearchSession) -> Self {
        Self {
            sessions: vec![session],
        }
    }
}
