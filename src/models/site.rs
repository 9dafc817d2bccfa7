//! 站点配置
//!
//! 所有与页面结构相关的选择器都放在这里，页面改版时只需修改配置文件。

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PaginationMode;
use crate::error::ConfigError;
use crate::models::session::SearchSession;

/// 按文本匹配的元素探测：在 `selector` 命中的元素中找文本包含任一关键词的那个
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProbe {
    pub selector: String,
    /// 大小写不敏感的子串
    pub texts: Vec<String>,
}

impl TextProbe {
    pub fn new(selector: &str, texts: &[&str]) -> Self {
        Self {
            selector: selector.to_string(),
            texts: texts.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// 文本是否命中
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.texts.iter().any(|t| text.contains(&t.to_lowercase()))
    }
}

/// 结果列表页的选择器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// 职位卡片
    pub card: String,
    /// 卡片内的标题（同时也是详情链接）
    pub title: String,
    pub company: String,
    pub location: String,
    /// 卡片内的详情链接，取 `href` 属性
    pub link: String,
    /// "第 N 页，共 M 页" 指示元素
    pub page_indicator: String,
    /// 指示元素上承载文本的属性
    pub page_indicator_attribute: String,
    /// "下一页" 控件
    pub next_control: String,
}

/// 详情页的选择器，每个字段都是按顺序尝试的回退列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectors {
    pub description: Vec<String>,
    pub posted_at: Vec<String>,
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    /// 登录墙
    pub gate: Vec<String>,
    pub apply: TextProbe,
}

/// 滚动加载模式的参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// 卡片数量达到该值后停止滚动，同时也是本页处理数量的上限
    pub target_items: usize,
    pub max_attempts: u32,
    /// 每次滚动后等待新结果加载的时间（毫秒）
    pub delay_ms: u64,
    /// 可滚动的结果容器，未设置或未找到时滚动整个窗口
    pub container: Option<String>,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            target_items: 100,
            max_attempts: 30,
            delay_ms: 800,
            container: None,
        }
    }
}

/// 站点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    /// 搜索地址，关键词和地点以查询参数附加
    pub search_url: String,
    pub keyword_param: String,
    pub location_param: String,
    /// URL 翻页模式下的页码参数
    pub page_param: String,
    /// 设置时页码参数按结果偏移计算：第 N 页为 `(N - 1) * page_offset`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_offset: Option<u32>,
    /// 默认翻页方式
    #[serde(default)]
    pub pagination: PaginationMode,
    /// 只保留链接中包含该子串的记录
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_filter: Option<String>,
    #[serde(default)]
    pub scroll: ScrollSettings,
    /// Cookie 同意按钮
    pub consent: TextProbe,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
}

impl SiteProfile {
    /// Dice 的默认配置
    pub fn dice() -> Self {
        Self {
            name: "dice".to_string(),
            search_url: "https://www.dice.com/jobs".to_string(),
            keyword_param: "q".to_string(),
            location_param: "location".to_string(),
            page_param: "page".to_string(),
            page_offset: None,
            pagination: PaginationMode::NextControl,
            link_filter: Some("/job-detail/".to_string()),
            scroll: ScrollSettings::default(),
            consent: TextProbe::new("button", &["Accept all", "Accept"]),
            listing: ListingSelectors {
                card: r#"[data-testid="job-card"]"#.to_string(),
                title: r#"[data-testid="job-search-job-detail-link"]"#.to_string(),
                company: r#"a[href*="/company-profile/"] p"#.to_string(),
                location: "p.text-sm.font-normal.text-zinc-600".to_string(),
                link: r#"[data-testid="job-search-job-detail-link"]"#.to_string(),
                page_indicator: r#"section[aria-label*="Page"]"#.to_string(),
                page_indicator_attribute: "aria-label".to_string(),
                next_control: r#"span[aria-label="Next"][role="link"]"#.to_string(),
            },
            detail: DetailSelectors {
                description: vec![
                    r#"[data-testid="jobDescriptionHtml"]"#.to_string(),
                    ".job-description".to_string(),
                    "main".to_string(),
                ],
                posted_at: vec![
                    r#"[data-testid="job-detail-header-card"] span"#.to_string(),
                    ".posted-date".to_string(),
                ],
                title: vec!["h1".to_string()],
                company: vec![r#"a[data-cy="companyNameLink"]"#.to_string()],
                location: vec![r#"li[data-cy="location"]"#.to_string()],
                gate: vec![
                    r#"div[role="dialog"]"#.to_string(),
                    ".sign-in-form".to_string(),
                ],
                apply: TextProbe::new("button", &["Easy apply", "Easy Apply Now"]),
            },
        }
    }

    /// LinkedIn 公开职位页的配置
    pub fn linkedin() -> Self {
        Self {
            name: "linkedin".to_string(),
            search_url: "https://www.linkedin.com/jobs/search".to_string(),
            keyword_param: "keywords".to_string(),
            location_param: "location".to_string(),
            page_param: "start".to_string(),
            page_offset: Some(25),
            pagination: PaginationMode::Scroll,
            link_filter: Some("/jobs/view/".to_string()),
            scroll: ScrollSettings {
                container: Some(
                    ".jobs-search-results__list, ul.jobs-search__results-list".to_string(),
                ),
                ..ScrollSettings::default()
            },
            consent: TextProbe::new("button", &["Accept all", "Accept"]),
            listing: ListingSelectors {
                card: "ul.jobs-search__results-list li".to_string(),
                title: "h3.base-search-card__title".to_string(),
                company: "h4.base-search-card__subtitle".to_string(),
                location: ".job-search-card__location".to_string(),
                link: "a.base-card__full-link".to_string(),
                page_indicator: r#"section[aria-label*="Page"]"#.to_string(),
                page_indicator_attribute: "aria-label".to_string(),
                next_control: r#"button[aria-label="Next"]"#.to_string(),
            },
            detail: DetailSelectors {
                description: vec![
                    ".show-more-less-html__markup".to_string(),
                    ".jobs-description__content".to_string(),
                    ".description__text".to_string(),
                    ".job-description".to_string(),
                    "main".to_string(),
                ],
                posted_at: vec![
                    "span.posted-time-ago__text".to_string(),
                    ".posted-time-ago__text".to_string(),
                    ".jobs-unified-top-card__posted-date".to_string(),
                ],
                title: vec![
                    "h1".to_string(),
                    ".topcard__title".to_string(),
                    ".jobs-unified-top-card__job-title".to_string(),
                ],
                company: vec![
                    "a.topcard__org-name-link".to_string(),
                    "a.jobs-unified-top-card__company-url".to_string(),
                    ".topcard__flavor a".to_string(),
                    ".topcard__flavor".to_string(),
                ],
                location: vec![
                    ".topcard__flavor--bullet".to_string(),
                    ".jobs-unified-top-card__bullet".to_string(),
                    ".jobs-unified-top-card__subtitle-primary-grouping > span".to_string(),
                ],
                gate: vec![
                    r#"div[role="dialog"]"#.to_string(),
                    ".sign-in-outlet".to_string(),
                    ".sign-in-form".to_string(),
                ],
                apply: TextProbe::new("button", &["Easy Apply"]),
            },
        }
    }

    /// 构造搜索地址，`page` 为 None 时不带页码参数
    pub fn search_url(&self, session: &SearchSession, page: Option<u32>) -> Result<String, ConfigError> {
        let mut url = Url::parse(&self.search_url).map_err(|source| ConfigError::InvalidSearchUrl {
            template: self.search_url.clone(),
            source,
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(&self.keyword_param, &session.keyword);
            query.append_pair(&self.location_param, &session.location_filter);
            if let Some(page) = page {
                query.append_pair(&self.page_param, &self.page_value(page).to_string());
            }
        }
        Ok(url.into())
    }

    fn page_value(&self, page: u32) -> u32 {
        match self.page_offset {
            Some(step) => page.saturating_sub(1) * step,
            None => page,
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::dice()
    }
}
