//! 记录提取服务 - 业务能力层
//!
//! 只负责把当前结果页的卡片变成 `RawRecord`，不关心翻页

use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::infrastructure::{BrowsingContext, DomElement};
use crate::models::{ListingSelectors, RawRecord};

/// 记录提取器
pub struct RecordExtractor {
    selectors: ListingSelectors,
}

impl RecordExtractor {
    pub fn new(selectors: ListingSelectors) -> Self {
        Self { selectors }
    }

    /// 按 DOM 顺序提取当前页的全部卡片
    ///
    /// 每个子字段独立解析，缺失即为 None，不影响同一卡片的其他字段；
    /// 只有致命错误会返回 Err。
    pub async fn extract(&self, page: &dyn BrowsingContext) -> DriverResult<Vec<RawRecord>> {
        let cards = page.query_all(&self.selectors.card).await?;
        debug!("找到 {} 张职位卡片", cards.len());

        let mut records = Vec::with_capacity(cards.len());
        for card in &cards {
            records.push(self.extract_card(card.as_ref()).await?);
        }
        Ok(records)
    }

    async fn extract_card(&self, card: &dyn DomElement) -> DriverResult<RawRecord> {
        let title = optional(child_text(card, &self.selectors.title).await)?;
        let company = optional(child_text(card, &self.selectors.company).await)?;
        let location = optional(child_text(card, &self.selectors.location).await)?;
        let link = optional(child_href(card, &self.selectors.link).await)?;
        // 卡片全文原样保留
        let body_text = optional(card.text().await)?.unwrap_or_default();

        Ok(RawRecord {
            title,
            company,
            location,
            link,
            body_text,
        })
    }
}

/// 非致命错误视为字段缺失
fn optional<T>(result: DriverResult<Option<T>>) -> DriverResult<Option<T>> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("字段读取失败，记为缺失: {}", e);
            Ok(None)
        }
    }
}

async fn child_text(card: &dyn DomElement, selector: &str) -> DriverResult<Option<String>> {
    let Some(el) = card.query(selector).await? else {
        return Ok(None);
    };
    Ok(el
        .text()
        .await?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

/// 优先读取 `href` DOM 属性（绝对地址），其次读 HTML 属性
async fn child_href(card: &dyn DomElement, selector: &str) -> DriverResult<Option<String>> {
    let Some(el) = card.query(selector).await? else {
        return Ok(None);
    };
    let href = match el.property("href").await {
        Ok(Some(href)) => Some(href),
        Ok(None) => el.attribute("href").await?,
        Err(e @ DriverError::Disconnected(_)) => return Err(e),
        Err(_) => el.attribute("href").await?,
    };
    Ok(href.filter(|h| !h.is_empty()))
}
