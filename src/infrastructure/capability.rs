//! 浏览器能力边界
//!
//! 核心逻辑只通过这里的 trait 访问浏览器，不关心底层用的是 chromiumoxide 还是测试替身。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DriverResult;

/// 导航完成的判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// DOM 解析完成即可
    #[default]
    DomContentLoaded,
    /// 等待网络空闲
    NetworkIdle,
}

/// 元素句柄
pub type ElementHandle = Box<dyn DomElement>;

/// 一个 DOM 元素
#[async_trait]
pub trait DomElement: Send + Sync {
    /// 渲染后的文本（innerText）
    async fn text(&self) -> DriverResult<Option<String>>;

    /// HTML 属性
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;

    /// DOM 属性（如 `href` 会得到绝对地址）
    async fn property(&self, name: &str) -> DriverResult<Option<String>>;

    /// 在元素内查找第一个匹配的子元素
    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>>;

    /// 点击
    async fn click(&self) -> DriverResult<()>;
}

/// 一个独立的浏览上下文（标签页）
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// 导航到指定地址
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> DriverResult<()>;

    /// 查找第一个匹配的元素
    async fn query(&self, selector: &str) -> DriverResult<Option<ElementHandle>>;

    /// 查找所有匹配的元素，保持 DOM 顺序
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    /// 等待元素出现，超时返回 [`crate::error::DriverError::Timeout`]
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> DriverResult<()>;

    /// 等待当前导航完成
    async fn wait_for_navigation(&self, wait: WaitPolicy) -> DriverResult<()>;

    /// 向下滚动以触发懒加载：优先滚动 `container`，找不到时滚动整个窗口
    async fn scroll_down(&self, container: Option<&str>) -> DriverResult<()>;

    /// 截图并保存到文件
    async fn screenshot(&self, path: &Path, full_page: bool) -> DriverResult<()>;

    /// 释放上下文
    async fn close(&self) -> DriverResult<()>;
}

/// 页面获取能力：打开新的浏览上下文
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 打开共享浏览器状态的页面（用于结果列表）
    async fn open_page(&self) -> DriverResult<Box<dyn BrowsingContext>>;

    /// 打开隔离的上下文（独立 cookie 与导航状态，用于详情页）
    async fn open_isolated(&self) -> DriverResult<Box<dyn BrowsingContext>>;
}

/// 在 `selectors` 中按顺序查找，返回第一个非空文本
///
/// 单个选择器出错时继续尝试下一个，只有致命错误会返回。
pub async fn first_text(
    ctx: &dyn BrowsingContext,
    selectors: &[String],
) -> DriverResult<Option<String>> {
    for selector in selectors {
        match text_of(ctx, selector).await {
            Ok(Some(text)) => return Ok(Some(text)),
            Ok(None) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::debug!("选择器 {} 读取失败: {}", selector, e),
        }
    }
    Ok(None)
}

/// 在 `selector` 命中的元素中找文本满足 `predicate` 的第一个
pub async fn find_by_text<F>(
    ctx: &dyn BrowsingContext,
    selector: &str,
    predicate: F,
) -> DriverResult<Option<ElementHandle>>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    for el in ctx.query_all(selector).await? {
        if let Some(text) = el.text().await? {
            if predicate(&text) {
                return Ok(Some(el));
            }
        }
    }
    Ok(None)
}

/// `selectors` 中是否有任何一个存在
pub async fn any_present(ctx: &dyn BrowsingContext, selectors: &[String]) -> DriverResult<bool> {
    for selector in selectors {
        if ctx.query(selector).await?.is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn text_of(ctx: &dyn BrowsingContext, selector: &str) -> DriverResult<Option<String>> {
    let Some(el) = ctx.query(selector).await? else {
        return Ok(None);
    };
    Ok(el
        .text()
        .await?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}
