//! 翻页控制 - 业务能力层
//!
//! 决定要爬多少页，并在页与页之间前进。每一页的内容交给 [`PageHandler`] 处理。
//!
//! 三种方式：
//! - URL 参数：直接导航到第 N 页的地址
//! - 下一页控件：点击后确认页面内容确实变化，再处理下一页
//! - 滚动加载：只有一页，反复滚动直到卡片数量达到目标或次数用尽

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{CrawlOptions, PaginationMode};
use crate::error::DriverResult;
use crate::infrastructure::{BrowsingContext, WaitPolicy};
use crate::models::{SearchSession, SiteProfile};

/// 每一页的回调
#[async_trait]
pub trait PageHandler: Send {
    /// 处理已加载好的第 `page_index` 页（从 1 开始）
    async fn handle_page(&mut self, page_index: u32, page: &dyn BrowsingContext) -> DriverResult<()>;
}

/// 翻页结束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// 达到页数上限
    Completed,
    /// 找不到"下一页"控件
    NextControlMissing,
    /// "下一页"控件被禁用
    NextControlDisabled,
    /// 翻页导航失败
    NavigationFailed(String),
}

/// 翻页结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOutcome {
    /// 实际处理的页数
    pub pages_visited: u32,
    /// 因等待卡片超时而跳过的页数
    pub pages_skipped: u32,
    /// 页面上显示的总页数（读不到时为 1）
    pub total_pages: u32,
    pub stop: StopReason,
}

impl PaginationOutcome {
    fn empty() -> Self {
        Self {
            pages_visited: 0,
            pages_skipped: 0,
            total_pages: 0,
            stop: StopReason::Completed,
        }
    }
}

static PAGE_COUNT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)of\s+(\d+)").expect("valid page count regex"));

/// 点击翻页后检查页面是否变化的间隔
const SETTLE_POLL: Duration = Duration::from_millis(250);

/// 从 "Page 1 of 11" 这类文本中解析总页数
pub fn parse_total_pages(label: &str) -> Option<u32> {
    PAGE_COUNT_REGEX.captures(label)?.get(1)?.as_str().parse().ok()
}

/// 页面内容的特征，用来判断点击之后是否真的换了页
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageFingerprint {
    indicator: Option<String>,
    cards: usize,
    first: Option<String>,
    last: Option<String>,
}

/// 翻页控制器
pub struct PaginationController<'a> {
    profile: &'a SiteProfile,
    mode: PaginationMode,
    listing_timeout: Duration,
    navigation_timeout: Duration,
    page_delay: Duration,
}

impl<'a> PaginationController<'a> {
    pub fn new(profile: &'a SiteProfile, options: &CrawlOptions) -> Self {
        Self {
            profile,
            mode: options.pagination_for(profile),
            listing_timeout: options.listing_timeout,
            navigation_timeout: options.navigation_timeout,
            page_delay: options.page_delay,
        }
    }

    /// 依次爬取 `min(max_pages, 总页数)` 页
    ///
    /// 单页的问题（卡片超时、控件缺失、页数读不到）都不会中断整个会话，
    /// 只有致命错误会返回 Err。
    pub async fn run(
        &self,
        page: &dyn BrowsingContext,
        session: &SearchSession,
        handler: &mut dyn PageHandler,
    ) -> DriverResult<PaginationOutcome> {
        let mut outcome = PaginationOutcome::empty();
        if session.max_pages == 0 {
            info!("⛔ 最大页数为 0，不加载任何页面");
            return Ok(outcome);
        }

        let first_url = match self.profile.search_url(session, None) {
            Ok(url) => url,
            Err(e) => {
                warn!("⚠️ 无法构造搜索地址: {}", e);
                outcome.stop = StopReason::NavigationFailed(e.to_string());
                return Ok(outcome);
            }
        };
        info!("🔎 正在打开: {}", first_url);
        tolerate(page.navigate(&first_url, WaitPolicy::NetworkIdle).await, "打开搜索页")?;

        if self.mode == PaginationMode::Scroll {
            return self.run_scrolling(page, handler, outcome).await;
        }

        outcome.total_pages = self.read_total_pages(page).await?;
        info!("📊 检测到总页数: {}", outcome.total_pages);

        let bound = session.max_pages.min(outcome.total_pages);
        let mut index = 1;
        while index <= bound {
            info!("📄 正在爬取第 {}/{} 页...", index, bound);
            match page
                .wait_for_selector(&self.profile.listing.card, self.listing_timeout)
                .await
            {
                Ok(()) => {
                    handler.handle_page(index, page).await?;
                    outcome.pages_visited += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("⚠️ 第 {} 页没有检测到职位卡片，跳过: {}", index, e);
                    outcome.pages_skipped += 1;
                }
            }

            if index == bound {
                break;
            }

            match self.advance(page, session, index + 1).await? {
                None => {}
                Some(reason) => {
                    info!("⛔ 停止翻页: {:?}", reason);
                    outcome.stop = reason;
                    break;
                }
            }

            sleep(self.page_delay).await;
            index += 1;
        }

        Ok(outcome)
    }

    /// 滚动加载：所有结果都在第 1 页，滚动到卡片足够多后一次性处理
    async fn run_scrolling(
        &self,
        page: &dyn BrowsingContext,
        handler: &mut dyn PageHandler,
        mut outcome: PaginationOutcome,
    ) -> DriverResult<PaginationOutcome> {
        let settings = &self.profile.scroll;
        outcome.total_pages = 1;

        match page
            .wait_for_selector(&self.profile.listing.card, self.listing_timeout)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("⚠️ 没有检测到职位卡片，跳过: {}", e);
                outcome.pages_skipped = 1;
                return Ok(outcome);
            }
        }

        let mut attempts = 0;
        let mut loaded = self.count_cards(page).await?;
        while loaded < settings.target_items && attempts < settings.max_attempts {
            if let Err(e) = page.scroll_down(settings.container.as_deref()).await {
                if e.is_fatal() {
                    return Err(e);
                }
                debug!("滚动失败: {}", e);
            }
            sleep(Duration::from_millis(settings.delay_ms)).await;
            attempts += 1;
            loaded = self.count_cards(page).await?;
            debug!("第 {} 次滚动后有 {} 个卡片", attempts, loaded);
        }
        info!("📜 滚动 {} 次，共加载 {} 个职位卡片", attempts, loaded);

        handler.handle_page(1, page).await?;
        outcome.pages_visited = 1;
        Ok(outcome)
    }

    async fn count_cards(&self, page: &dyn BrowsingContext) -> DriverResult<usize> {
        Ok(quiet(page.query_all(&self.profile.listing.card).await)?
            .map(|cards| cards.len())
            .unwrap_or(0))
    }

    /// 读取总页数，读不到或解析失败时按 1 页处理
    async fn read_total_pages(&self, page: &dyn BrowsingContext) -> DriverResult<u32> {
        let listing = &self.profile.listing;
        let label = match page.query(&listing.page_indicator).await {
            Ok(Some(el)) => tolerate(el.attribute(&listing.page_indicator_attribute).await, "读取页数")?
                .flatten(),
            Ok(None) => None,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!("页数指示器查询失败: {}", e);
                None
            }
        };

        match label.as_deref().and_then(parse_total_pages) {
            Some(total) => Ok(total.max(1)),
            None => {
                warn!("⚠️ 未能读取页数指示器 ({:?})，按 1 页处理", label);
                Ok(1)
            }
        }
    }

    /// 前进到下一页；返回 Some 表示应停止翻页
    async fn advance(
        &self,
        page: &dyn BrowsingContext,
        session: &SearchSession,
        next_index: u32,
    ) -> DriverResult<Option<StopReason>> {
        match self.mode {
            PaginationMode::UrlParameter => {
                let url = match self.profile.search_url(session, Some(next_index)) {
                    Ok(url) => url,
                    Err(e) => return Ok(Some(StopReason::NavigationFailed(e.to_string()))),
                };
                debug!("跳转到第 {} 页: {}", next_index, url);
                // 导航失败时交给下一轮的卡片等待去跳过该页
                tolerate(page.navigate(&url, WaitPolicy::DomContentLoaded).await, "翻页")?;
                Ok(None)
            }
            PaginationMode::NextControl => self.click_next(page).await,
            // 滚动模式只有一页，不会走到这里
            PaginationMode::Scroll => Ok(Some(StopReason::Completed)),
        }
    }

    async fn click_next(&self, page: &dyn BrowsingContext) -> DriverResult<Option<StopReason>> {
        let selector = &self.profile.listing.next_control;
        let next = match tolerate(page.query(selector).await, "查找下一页按钮")?.flatten() {
            Some(next) => next,
            None => return Ok(Some(StopReason::NextControlMissing)),
        };

        let aria_disabled = tolerate(next.attribute("aria-disabled").await, "读取按钮状态")?.flatten();
        let disabled = tolerate(next.attribute("disabled").await, "读取按钮状态")?.flatten();
        if aria_disabled.as_deref() == Some("true") || disabled.is_some() {
            return Ok(Some(StopReason::NextControlDisabled));
        }

        let before = self.fingerprint(page).await?;

        // 点击与等待同时进行；单页应用不触发导航时 wait_for_navigation 会立刻返回
        let (navigated, clicked) =
            futures::join!(page.wait_for_navigation(WaitPolicy::NetworkIdle), next.click());
        for result in [clicked, navigated] {
            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => return Ok(Some(StopReason::NavigationFailed(e.to_string()))),
            }
        }

        // 页面内容变化之后才允许提取下一页
        let deadline = Instant::now() + self.navigation_timeout;
        loop {
            if self.fingerprint(page).await? != before {
                return Ok(None);
            }
            if Instant::now() >= deadline {
                return Ok(Some(StopReason::NavigationFailed(format!(
                    "点击下一页后 {:?} 内页面内容没有变化",
                    self.navigation_timeout
                ))));
            }
            sleep(SETTLE_POLL).await;
        }
    }

    async fn fingerprint(&self, page: &dyn BrowsingContext) -> DriverResult<PageFingerprint> {
        let listing = &self.profile.listing;

        let indicator = match quiet(page.query(&listing.page_indicator).await)?.flatten() {
            Some(el) => quiet(el.attribute(&listing.page_indicator_attribute).await)?.flatten(),
            None => None,
        };

        let cards = quiet(page.query_all(&listing.card).await)?.unwrap_or_default();
        let first = match cards.first() {
            Some(card) => quiet(card.text().await)?.flatten(),
            None => None,
        };
        let last = match cards.last() {
            Some(card) => quiet(card.text().await)?.flatten(),
            None => None,
        };

        Ok(PageFingerprint {
            indicator,
            cards: cards.len(),
            first,
            last,
        })
    }
}

/// 非致命错误记录日志后转为 None，致命错误继续上抛
fn tolerate<T>(result: DriverResult<T>, action: &str) -> DriverResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("⚠️ {}失败: {}", action, e);
            Ok(None)
        }
    }
}

/// 与 [`tolerate`] 相同，但只在 debug 级别记录，用于轮询
fn quiet<T>(result: DriverResult<T>) -> DriverResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("读取页面失败: {}", e);
            Ok(None)
        }
    }
}
