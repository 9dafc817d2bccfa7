//! 单页处理流程 - 流程层
//!
//! 核心职责：定义"一页结果"的完整处理流程
//!
//! 流程顺序：
//! 1. 关闭 Cookie 提示
//! 2. 提取卡片 → 链接过滤 → 每页数量上限
//! 3. 去重（在访问详情页之前）
//! 4. 访问详情页（可选，有限并发）
//! 5. 分类 → 写入会话上下文

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::{CrawlOptions, PaginationMode};
use crate::error::{DriverError, DriverResult};
use crate::infrastructure::BrowsingContext;
use crate::models::{EnrichedRecord, RawRecord, SiteProfile};
use crate::services::{
    dismiss_consent, Categorizer, DetailVisitor, PageHandler, RecordExtractor, VisitCtx,
};
use crate::workflow::crawl_ctx::CrawlCtx;

/// 单页处理流程
///
/// - 不持有浏览器资源，只依赖业务能力（services）
/// - 会话状态全部在 [`CrawlCtx`] 中
pub struct CrawlFlow<'a> {
    profile: &'a SiteProfile,
    extractor: RecordExtractor,
    visitor: Option<DetailVisitor<'a>>,
    categorizer: &'a Categorizer,
    options: &'a CrawlOptions,
    ctx: CrawlCtx,
}

impl<'a> CrawlFlow<'a> {
    pub fn new(
        profile: &'a SiteProfile,
        visitor: Option<DetailVisitor<'a>>,
        categorizer: &'a Categorizer,
        options: &'a CrawlOptions,
        ctx: CrawlCtx,
    ) -> Self {
        Self {
            profile,
            extractor: RecordExtractor::new(profile.listing.clone()),
            visitor,
            categorizer,
            options,
            ctx,
        }
    }

    pub fn into_ctx(self) -> CrawlCtx {
        self.ctx
    }

    /// 链接过滤与每页数量上限
    ///
    /// 滚动加载模式下没有配置上限时，以滚动目标数量为上限。
    fn select(&mut self, records: Vec<RawRecord>) -> Vec<RawRecord> {
        let before = records.len();
        let mut selected: Vec<RawRecord> = match self.options.link_filter_for(self.profile) {
            Some(pattern) => records
                .into_iter()
                .filter(|r| r.link.as_deref().is_some_and(|l| l.contains(pattern)))
                .collect(),
            None => records,
        };
        let limit = self.options.max_items_per_page.or_else(|| {
            (self.options.pagination_for(self.profile) == PaginationMode::Scroll)
                .then_some(self.profile.scroll.target_items)
        });
        if let Some(limit) = limit {
            selected.truncate(limit);
        }
        self.ctx.filtered_out += before - selected.len();
        selected
    }

    fn finish(&mut self, mut record: EnrichedRecord, page_index: u32) {
        record.categories = self.categorizer.classify(&record);
        self.ctx.push(record, page_index);
    }

    /// 逐条访问详情页；遇到致命错误时把剩余记录按未访问保存后返回错误
    async fn visit_all(
        &mut self,
        page_index: u32,
        admitted: Vec<(usize, RawRecord)>,
    ) -> DriverResult<()> {
        let Some(visitor) = self.visitor.as_ref() else {
            for (_, raw) in admitted {
                self.finish(EnrichedRecord::unvisited(raw), page_index);
            }
            return Ok(());
        };

        let delay = self.options.item_delay;
        let mut visited: Vec<EnrichedRecord> = Vec::with_capacity(admitted.len());
        let mut fatal: Option<DriverError> = None;
        {
            // 先收集成 Vec，避免闭包的生命周期进入 Send 检查
            let visits: Vec<_> = admitted
                .iter()
                .map(|(item_index, raw)| {
                    let ctx = VisitCtx {
                        page_index,
                        item_index: *item_index,
                    };
                    async move {
                        sleep(delay).await;
                        visitor.visit(raw, ctx).await
                    }
                })
                .collect();
            let mut results = stream::iter(visits).buffered(self.options.detail_concurrency);

            while let Some(result) = results.next().await {
                match result {
                    Ok(record) => visited.push(record),
                    Err(e) => {
                        fatal = Some(e);
                        break;
                    }
                }
            }
        }

        let done = visited.len();
        for record in visited {
            self.finish(record, page_index);
        }

        match fatal {
            None => Ok(()),
            Some(e) => {
                error!("❌ 详情页访问中浏览器不可用: {}", e);
                for (_, raw) in admitted.into_iter().skip(done) {
                    let mut record = EnrichedRecord::unvisited(raw);
                    record.visit_error = Some(e.to_string());
                    self.finish(record, page_index);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl PageHandler for CrawlFlow<'_> {
    async fn handle_page(&mut self, page_index: u32, page: &dyn BrowsingContext) -> DriverResult<()> {
        match dismiss_consent(page, &self.profile.consent).await {
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => debug!("关闭 Cookie 提示失败: {}", e),
            Ok(_) => {}
        }

        let records = self.extractor.extract(page).await?;
        info!("✅ 第 {} 页找到 {} 条职位", page_index, records.len());

        let selected = self.select(records);
        let mut admitted = Vec::with_capacity(selected.len());
        for (item_index, raw) in selected.into_iter().enumerate() {
            if self.ctx.admit(raw.link.as_deref()) {
                admitted.push((item_index, raw));
            } else {
                debug!("跳过重复链接: {:?}", raw.link);
            }
        }

        self.visit_all(page_index, admitted).await?;
        debug!("{}", self.ctx);
        Ok(())
    }
}
