//! 测试用的内存浏览器
//!
//! 页面由"选择器 → 节点列表"的映射组成，只支持测试用站点配置里出现的选择器。

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use job_crawl::error::{DriverError, DriverResult};
use job_crawl::infrastructure::{BrowsingContext, DomElement, ElementHandle, PageFetcher, WaitPolicy};
use job_crawl::config::PaginationMode;
use job_crawl::models::{DetailSelectors, ListingSelectors, ScrollSettings, SiteProfile, TextProbe};

pub const SEARCH_URL: &str = "https://jobs.test/search";

/// 测试站点的选择器
pub fn test_profile() -> SiteProfile {
    SiteProfile {
        name: "fake".to_string(),
        search_url: SEARCH_URL.to_string(),
        keyword_param: "q".to_string(),
        location_param: "location".to_string(),
        page_param: "page".to_string(),
        page_offset: None,
        pagination: PaginationMode::NextControl,
        link_filter: None,
        scroll: ScrollSettings::default(),
        consent: TextProbe::new("button.consent", &["Accept"]),
        listing: ListingSelectors {
            card: ".card".to_string(),
            title: ".title".to_string(),
            company: ".company".to_string(),
            location: ".location".to_string(),
            link: "a.link".to_string(),
            page_indicator: ".pager".to_string(),
            page_indicator_attribute: "aria-label".to_string(),
            next_control: ".next".to_string(),
        },
        detail: DetailSelectors {
            description: vec![".desc".to_string(), "main".to_string()],
            posted_at: vec![".posted".to_string()],
            title: vec!["h1".to_string()],
            company: vec![".co".to_string()],
            location: vec![".loc".to_string()],
            gate: vec![".sign-in".to_string()],
            apply: TextProbe::new("button", &["Easy apply"]),
        },
    }
}

/// 滚动加载的测试站点：每次滚动不等待
pub fn scroll_profile(target_items: usize, max_attempts: u32) -> SiteProfile {
    SiteProfile {
        pagination: PaginationMode::Scroll,
        scroll: ScrollSettings {
            target_items,
            max_attempts,
            delay_ms: 0,
            container: Some(".results".to_string()),
        },
        ..test_profile()
    }
}

// ========== 页面结构 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Click {
    Nothing,
    NextPage,
    FailNavigation,
}

/// 一个 DOM 节点
#[derive(Debug, Clone)]
pub struct FakeNode {
    text: Option<String>,
    attrs: HashMap<String, String>,
    children: HashMap<String, Vec<FakeNode>>,
    click: Click,
}

impl FakeNode {
    pub fn new() -> Self {
        Self {
            text: None,
            attrs: HashMap::new(),
            children: HashMap::new(),
            click: Click::Nothing,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, node: FakeNode) -> Self {
        self.children.entry(selector.to_string()).or_default().push(node);
        self
    }
}

/// 一个页面：选择器 → 命中的节点
#[derive(Debug, Clone, Default)]
pub struct FakeDocument {
    nodes: HashMap<String, Vec<FakeNode>>,
}

impl FakeDocument {
    pub fn with(mut self, selector: &str, node: FakeNode) -> Self {
        self.nodes.entry(selector.to_string()).or_default().push(node);
        self
    }

    fn first(&self, selector: &str) -> Option<FakeNode> {
        self.nodes.get(selector).and_then(|n| n.first().cloned())
    }

    fn all(&self, selector: &str) -> Vec<FakeNode> {
        self.nodes.get(selector).cloned().unwrap_or_default()
    }

    /// 只保留前 `n` 个命中 `selector` 的节点（模拟尚未加载的结果）
    fn truncate(&mut self, selector: &str, n: usize) {
        if let Some(nodes) = self.nodes.get_mut(selector) {
            nodes.truncate(n);
        }
    }
}

/// 职位卡片
pub fn card(title: &str, company: &str, location: Option<&str>, link: Option<&str>) -> FakeNode {
    let mut body = format!("{}\n{}", title, company);
    let mut node = FakeNode::new()
        .child(".title", FakeNode::new().text(title))
        .child(".company", FakeNode::new().text(company));
    if let Some(location) = location {
        body.push('\n');
        body.push_str(location);
        node = node.child(".location", FakeNode::new().text(location));
    }
    if let Some(link) = link {
        node = node.child("a.link", FakeNode::new().text(title).attr("href", link));
    }
    node.text(&body)
}

/// "下一页"控件的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Enabled,
    Disabled,
    Missing,
    /// 点击后导航失败
    Broken,
    /// 可以点击，但页面不会变化
    Stale,
}

/// 结果页
pub fn results_page(cards: Vec<FakeNode>, total_pages: Option<u32>, next: Next) -> FakeDocument {
    let mut doc = FakeDocument::default();
    for c in cards {
        doc = doc.with(".card", c);
    }
    if let Some(total) = total_pages {
        doc = doc.with(
            ".pager",
            FakeNode::new().attr("aria-label", &format!("Page 1 of {}", total)),
        );
    }
    let next_node = FakeNode::new().text("Next");
    match next {
        Next::Enabled => doc.with(".next", FakeNode { click: Click::NextPage, ..next_node }),
        Next::Disabled => doc.with(".next", next_node.attr("aria-disabled", "true")),
        Next::Broken => doc.with(".next", FakeNode { click: Click::FailNavigation, ..next_node }),
        Next::Stale => doc.with(".next", next_node),
        Next::Missing => doc,
    }
}

/// 详情页
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    pub description: Option<String>,
    pub posted_at: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub easy_apply: bool,
    pub gated: bool,
    pub consent_banner: bool,
}

impl DetailPage {
    fn document(&self) -> FakeDocument {
        let mut doc = FakeDocument::default();
        let fields = [
            (".desc", &self.description),
            (".posted", &self.posted_at),
            ("h1", &self.title),
            (".co", &self.company),
            (".loc", &self.location),
        ];
        for (selector, value) in fields {
            if let Some(value) = value {
                doc = doc.with(selector, FakeNode::new().text(value));
            }
        }
        doc = doc.with("button", FakeNode::new().text("Save job"));
        if self.easy_apply {
            doc = doc.with("button", FakeNode::new().text("Easy apply"));
        }
        if self.gated {
            doc = doc.with(".sign-in", FakeNode::new().text("Sign in to continue"));
        }
        if self.consent_banner {
            doc = doc.with("button.consent", FakeNode::new().text("Accept all"));
        }
        doc
    }
}

/// 访问详情页时的导航行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Ok,
    Timeout,
    /// 浏览器在导航中崩溃
    Disconnect,
}

// ========== 站点状态 ==========

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Blank,
    Results(u32),
    Detail(String),
}

#[derive(Debug, Default)]
struct SiteState {
    results: Vec<FakeDocument>,
    details: HashMap<String, (DetailPage, Navigation)>,
    disconnected: bool,
    opened_pages: usize,
    opened_isolated: usize,
    closed: usize,
    screenshots: usize,
    consent_clicks: usize,
    navigations: Vec<String>,
    detail_visits: HashMap<String, usize>,
    /// 导航失败的结果页（页码）
    broken_results: Vec<u32>,
    /// 点击"下一页"后过多久才真正换页
    click_delay: Option<Duration>,
    /// 每次滚动新出现的卡片数量，None 表示一次全部显示
    feed_batch: Option<usize>,
    scrolls: usize,
    scroll_targets: Vec<Option<String>>,
    /// 结果页地址中的页码参数，以及按偏移翻页时的步长
    page_param: Option<(String, Option<u32>)>,
}

/// 内存站点，同时实现 [`PageFetcher`]
#[derive(Clone, Default)]
pub struct FakeSite {
    state: Arc<Mutex<SiteState>>,
}

impl FakeSite {
    pub fn new(results: Vec<FakeDocument>) -> Self {
        let site = Self::default();
        site.lock().results = results;
        site
    }

    pub fn detail(self, link: &str, page: DetailPage) -> Self {
        self.detail_with(link, page, Navigation::Ok)
    }

    pub fn detail_with(self, link: &str, page: DetailPage, navigation: Navigation) -> Self {
        self.lock().details.insert(link.to_string(), (page, navigation));
        self
    }

    /// 导航到该结果页时失败
    pub fn break_results_page(self, page: u32) -> Self {
        self.lock().broken_results.push(page);
        self
    }

    /// 点击"下一页"立刻返回，页面在 `delay` 之后才切换
    pub fn with_click_delay(self, delay: Duration) -> Self {
        self.lock().click_delay = Some(delay);
        self
    }

    /// 结果页一开始只显示 `batch` 张卡片，每次滚动再多显示 `batch` 张
    pub fn feed_on_scroll(self, batch: usize) -> Self {
        self.lock().feed_batch = Some(batch);
        self
    }

    /// 结果页按 `param` 的结果偏移翻页，每页 `step` 条
    pub fn paged_by_offset(self, param: &str, step: u32) -> Self {
        self.lock().page_param = Some((param.to_string(), Some(step)));
        self
    }

    pub fn scrolls(&self) -> usize {
        self.lock().scrolls
    }

    pub fn scroll_targets(&self) -> Vec<Option<String>> {
        self.lock().scroll_targets.clone()
    }

    pub fn opened_isolated(&self) -> usize {
        self.lock().opened_isolated
    }

    /// 所有打开过的上下文（结果页 + 详情页）
    pub fn opened_total(&self) -> usize {
        let state = self.lock();
        state.opened_pages + state.opened_isolated
    }

    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    pub fn screenshots(&self) -> usize {
        self.lock().screenshots
    }

    pub fn consent_clicks(&self) -> usize {
        self.lock().consent_clicks
    }

    pub fn visits_to(&self, link: &str) -> usize {
        self.lock().detail_visits.get(link).copied().unwrap_or(0)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn fetcher(&self) -> Box<dyn PageFetcher> {
        Box::new(self.clone())
    }

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().expect("fake site poisoned")
    }

    fn ensure_connected(&self) -> DriverResult<()> {
        if self.lock().disconnected {
            Err(DriverError::Disconnected("fake browser crashed".to_string()))
        } else {
            Ok(())
        }
    }

    fn document_at(&self, location: &Location) -> FakeDocument {
        let state = self.lock();
        match location {
            Location::Blank => FakeDocument::default(),
            Location::Results(page) => {
                let mut doc = (*page as usize)
                    .checked_sub(1)
                    .and_then(|i| state.results.get(i))
                    .cloned()
                    .unwrap_or_default();
                if let Some(batch) = state.feed_batch {
                    doc.truncate(".card", batch * (state.scrolls + 1));
                }
                doc
            }
            Location::Detail(link) => state
                .details
                .get(link)
                .map(|(page, _)| page.document())
                .unwrap_or_default(),
        }
    }

    fn context(&self) -> Box<dyn BrowsingContext> {
        Box::new(FakeContext {
            site: self.clone(),
            location: Arc::new(Mutex::new(Location::Blank)),
        })
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn open_page(&self) -> DriverResult<Box<dyn BrowsingContext>> {
        self.ensure_connected()?;
        self.lock().opened_pages += 1;
        Ok(self.context())
    }

    async fn open_isolated(&self) -> DriverResult<Box<dyn BrowsingContext>> {
        self.ensure_connected()?;
        self.lock().opened_isolated += 1;
        Ok(self.context())
    }
}

// ========== 浏览上下文 ==========

struct FakeContext {
    site: FakeSite,
    location: Arc<Mutex<Location>>,
}

impl FakeContext {
    fn current(&self) -> FakeDocument {
        let location = self.location.lock().expect("location poisoned").clone();
        self.site.document_at(&location)
    }

    fn set_location(&self, location: Location) {
        *self.location.lock().expect("location poisoned") = location;
    }

    fn element(&self, node: FakeNode) -> ElementHandle {
        Box::new(FakeElement {
            node,
            site: self.site.clone(),
            location: self.location.clone(),
        })
    }
}

#[async_trait]
impl BrowsingContext for FakeContext {
    async fn navigate(&self, url: &str, _wait: WaitPolicy) -> DriverResult<()> {
        self.site.ensure_connected()?;
        self.site.lock().navigations.push(url.to_string());

        let detail = self.site.lock().details.get(url).map(|(_, nav)| *nav);
        if let Some(navigation) = detail {
            *self
                .site
                .lock()
                .detail_visits
                .entry(url.to_string())
                .or_default() += 1;
            return match navigation {
                Navigation::Ok => {
                    self.set_location(Location::Detail(url.to_string()));
                    Ok(())
                }
                Navigation::Timeout => Err(DriverError::timeout(
                    format!("navigation to {}", url),
                    Duration::from_secs(60),
                )),
                Navigation::Disconnect => {
                    self.site.lock().disconnected = true;
                    Err(DriverError::Disconnected("websocket closed".to_string()))
                }
            };
        }

        if url.starts_with(SEARCH_URL) {
            let (param, step) = self
                .site
                .lock()
                .page_param
                .clone()
                .unwrap_or_else(|| ("page".to_string(), None));
            let value: Option<u32> = url::Url::parse(url).ok().and_then(|u| {
                u.query_pairs()
                    .find(|(k, _)| k == param.as_str())
                    .and_then(|(_, v)| v.parse().ok())
            });
            let page = match (value, step) {
                (Some(offset), Some(step)) => offset / step + 1,
                (Some(page), None) => page,
                (None, _) => 1,
            };
            if self.site.lock().broken_results.contains(&page) {
                self.set_location(Location::Blank);
                return Err(DriverError::navigation(url, "net::ERR_CONNECTION_RESET"));
            }
            self.set_location(Location::Results(page));
            return Ok(());
        }

        Err(DriverError::navigation(url, "unknown host"))
    }

    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        self.site.ensure_connected()?;
        Ok(self.current().first(selector).map(|n| self.element(n)))
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        self.site.ensure_connected()?;
        Ok(self
            .current()
            .all(selector)
            .into_iter()
            .map(|n| self.element(n))
            .collect())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> DriverResult<()> {
        self.site.ensure_connected()?;
        if self.current().first(selector).is_some() {
            Ok(())
        } else {
            Err(DriverError::timeout(selector, timeout))
        }
    }

    async fn wait_for_navigation(&self, _wait: WaitPolicy) -> DriverResult<()> {
        self.site.ensure_connected()
    }

    async fn scroll_down(&self, container: Option<&str>) -> DriverResult<()> {
        self.site.ensure_connected()?;
        let mut state = self.site.lock();
        state.scrolls += 1;
        state.scroll_targets.push(container.map(str::to_string));
        Ok(())
    }

    async fn screenshot(&self, _path: &Path, _full_page: bool) -> DriverResult<()> {
        self.site.ensure_connected()?;
        self.site.lock().screenshots += 1;
        Ok(())
    }

    async fn close(&self) -> DriverResult<()> {
        self.site.lock().closed += 1;
        Ok(())
    }
}

struct FakeElement {
    node: FakeNode,
    site: FakeSite,
    location: Arc<Mutex<Location>>,
}

#[async_trait]
impl DomElement for FakeElement {
    async fn text(&self) -> DriverResult<Option<String>> {
        self.site.ensure_connected()?;
        Ok(self.node.text.clone())
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        self.site.ensure_connected()?;
        Ok(self.node.attrs.get(name).cloned())
    }

    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        self.attribute(name).await
    }

    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        self.site.ensure_connected()?;
        Ok(self
            .node
            .children
            .get(selector)
            .and_then(|n| n.first().cloned())
            .map(|node| -> ElementHandle {
                Box::new(FakeElement {
                    node,
                    site: self.site.clone(),
                    location: self.location.clone(),
                })
            }))
    }

    async fn click(&self) -> DriverResult<()> {
        self.site.ensure_connected()?;
        if self.node.text.as_deref() == Some("Accept all") {
            self.site.lock().consent_clicks += 1;
        }
        let delay = self.site.lock().click_delay;
        let mut location = self.location.lock().expect("location poisoned");
        match (self.node.click, location.clone()) {
            (Click::NextPage, Location::Results(page)) => {
                match delay {
                    // 单页应用：点击立即返回，内容稍后才替换
                    Some(delay) => {
                        let location = self.location.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            *location.lock().expect("location poisoned") = Location::Results(page + 1);
                        });
                    }
                    None => *location = Location::Results(page + 1),
                }
                Ok(())
            }
            (Click::FailNavigation, _) => Err(DriverError::navigation("next page", "click did nothing")),
            _ => Ok(()),
        }
    }
}
