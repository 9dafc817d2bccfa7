//! chromiumoxide 实现 - 基础设施层
//!
//! 持有 Browser 资源，只暴露能力，不认识职位记录。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::capability::{
    BrowsingContext, DomElement, ElementHandle, PageFetcher, WaitPolicy,
};

/// 轮询等待元素时的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 基于 chromiumoxide 的页面获取能力
pub struct ChromeFetcher {
    browser: Arc<Browser>,
    navigation_timeout: Duration,
}

impl ChromeFetcher {
    pub fn new(browser: Browser, navigation_timeout: Duration) -> Self {
        Self {
            browser: Arc::new(browser),
            navigation_timeout,
        }
    }

    fn wrap(&self, page: Page, context_id: Option<BrowserContextId>) -> Box<dyn BrowsingContext> {
        Box::new(ChromeContext {
            browser: self.browser.clone(),
            page,
            context_id,
            navigation_timeout: self.navigation_timeout,
        })
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn open_page(&self) -> DriverResult<Box<dyn BrowsingContext>> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(self.wrap(page, None))
    }

    async fn open_isolated(&self) -> DriverResult<Box<dyn BrowsingContext>> {
        let created = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await?;
        let context_id = created.result.browser_context_id;

        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(DriverError::Protocol)?;

        match self.browser.new_page(params).await {
            Ok(page) => Ok(self.wrap(page, Some(context_id))),
            Err(e) => {
                if let Err(dispose) = self
                    .browser
                    .execute(DisposeBrowserContextParams::new(context_id))
                    .await
                {
                    debug!("释放浏览器上下文失败: {}", dispose);
                }
                Err(e.into())
            }
        }
    }
}

/// 一个 chromiumoxide 标签页，可能属于独立的浏览器上下文
struct ChromeContext {
    browser: Arc<Browser>,
    page: Page,
    context_id: Option<BrowserContextId>,
    navigation_timeout: Duration,
}

#[async_trait]
impl BrowsingContext for ChromeContext {
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> DriverResult<()> {
        debug!("导航到: {}", url);
        let result = timeout(self.navigation_timeout, async {
            self.page.goto(url).await?;
            if wait == WaitPolicy::NetworkIdle {
                self.page.wait_for_navigation().await?;
            }
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => match DriverError::from(e) {
                fatal @ DriverError::Disconnected(_) => Err(fatal),
                other => Err(DriverError::navigation(url, other)),
            },
            Err(_) => Err(DriverError::timeout(format!("导航 {}", url), self.navigation_timeout)),
        }
    }

    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        match self.page.find_element(selector).await {
            Ok(el) => Ok(Some(Box::new(ChromeElement(el)))),
            Err(e) => missing_as_none(e),
        }
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements
                .into_iter()
                .map(|el| Box::new(ChromeElement(el)) as ElementHandle)
                .collect()),
            Err(e) => missing_as_none(e).map(|_: Option<ElementHandle>| Vec::new()),
        }
    }

    async fn wait_for_selector(&self, selector: &str, wait: Duration) -> DriverResult<()> {
        let deadline = Instant::now() + wait;
        loop {
            if self.query(selector).await?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(DriverError::timeout(selector, wait));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_navigation(&self, _wait: WaitPolicy) -> DriverResult<()> {
        match timeout(self.navigation_timeout, self.page.wait_for_navigation()).await {
            Ok(result) => result.map(|_| ()).map_err(DriverError::from),
            Err(_) => Err(DriverError::timeout("页面跳转", self.navigation_timeout)),
        }
    }

    async fn scroll_down(&self, container: Option<&str>) -> DriverResult<()> {
        let selector = serde_json::to_string(&container).map_err(|e| DriverError::Protocol(e.to_string()))?;
        let script = format!(
            r#"(() => {{
                const selector = {selector};
                const container = selector ? document.querySelector(selector) : null;
                if (container) container.scrollBy(0, container.scrollHeight || 1000);
                else window.scrollBy(0, window.innerHeight);
                return true;
            }})()"#
        );
        self.page.evaluate(script).await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> DriverResult<()> {
        let params = ScreenshotParams::builder().full_page(full_page).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map(|_| ())
            .map_err(|e| match DriverError::from(e) {
                fatal @ DriverError::Disconnected(_) => fatal,
                other => DriverError::Screenshot(other.to_string()),
            })
    }

    async fn close(&self) -> DriverResult<()> {
        self.page.clone().close().await?;
        if let Some(id) = &self.context_id {
            self.browser
                .execute(DisposeBrowserContextParams::new(id.clone()))
                .await?;
        }
        Ok(())
    }
}

/// 找不到元素不是错误
fn missing_as_none<T>(err: chromiumoxide::error::CdpError) -> DriverResult<Option<T>> {
    match DriverError::from(err) {
        DriverError::Element(_) => Ok(None),
        // 选择器无匹配时 CDP 返回的是协议错误
        DriverError::Protocol(msg) if msg.contains("Could not find node") => Ok(None),
        other => Err(other),
    }
}

struct ChromeElement(Element);

#[async_trait]
impl DomElement for ChromeElement {
    async fn text(&self) -> DriverResult<Option<String>> {
        Ok(self.0.inner_text().await?)
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.0.attribute(name).await?)
    }

    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        let value = self.0.property(name).await?;
        Ok(value.and_then(|v| v.as_str().map(str::to_string)))
    }

    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        match self.0.find_element(selector).await {
            Ok(el) => Ok(Some(Box::new(ChromeElement(el)))),
            Err(e) => missing_as_none(e),
        }
    }

    async fn click(&self) -> DriverResult<()> {
        self.0.click().await?;
        Ok(())
    }
}
