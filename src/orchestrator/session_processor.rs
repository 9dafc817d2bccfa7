//! 单个会话处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **资源管理**：为会话打开结果页，结束时释放
//! 2. **流程调度**：用 `PaginationController` 驱动 `CrawlFlow`
//! 3. **部分结果**：致命错误时仍返回已收集的记录
//! 4. **统计输出**：记录页数、记录数、重复数

use tracing::{error, info, warn};

use crate::config::CrawlOptions;
use crate::error::DriverError;
use crate::infrastructure::PageFetcher;
use crate::models::{EnrichedRecord, SearchSession, SiteProfile};
use crate::services::{Categorizer, DetailVisitor, PaginationController, PaginationOutcome};
use crate::workflow::{CrawlCtx, CrawlFlow};

/// 一次会话的结果
#[derive(Debug)]
pub struct SessionRun {
    pub session: SearchSession,
    pub records: Vec<EnrichedRecord>,
    /// 正常结束时的翻页结果
    pub outcome: Option<PaginationOutcome>,
    pub duplicates_skipped: usize,
    /// 中断会话的错误（是否致命见 `DriverError::is_fatal`）
    pub error: Option<DriverError>,
}

impl SessionRun {
    /// 是否因浏览器不可用而中断
    pub fn is_fatal(&self) -> bool {
        self.error.as_ref().is_some_and(DriverError::is_fatal)
    }

    pub fn pages_visited(&self) -> u32 {
        self.outcome.as_ref().map_or(0, |o| o.pages_visited)
    }
}

/// 处理单个搜索会话
///
/// 本函数不会返回错误：中断会话的错误记录在 `SessionRun::error` 中，已收集的记录照常返回。
pub async fn process_session(
    fetcher: &dyn PageFetcher,
    profile: &SiteProfile,
    categorizer: &Categorizer,
    options: &CrawlOptions,
    session: SearchSession,
) -> SessionRun {
    info!("🔎 开始会话: {}", session);

    let page = match fetcher.open_page().await {
        Ok(page) => page,
        Err(e) => {
            error!("❌ 无法打开结果页: {}", e);
            return SessionRun {
                session,
                records: Vec::new(),
                outcome: None,
                duplicates_skipped: 0,
                error: Some(e),
            };
        }
    };

    let visitor = options
        .visit_details
        .then(|| DetailVisitor::new(fetcher, profile, options.screenshot_dir.as_str()));
    let mut flow = CrawlFlow::new(profile, visitor, categorizer, options, CrawlCtx::new(session.clone()));

    let controller = PaginationController::new(profile, options);
    let result = controller.run(page.as_ref(), &session, &mut flow).await;

    if let Err(e) = page.close().await {
        warn!("关闭结果页失败: {}", e);
    }

    let ctx = flow.into_ctx();
    let duplicates_skipped = ctx.duplicates_skipped;
    if ctx.filtered_out > 0 {
        info!("🧹 过滤条件排除 {} 条", ctx.filtered_out);
    }
    let records = ctx.into_records();

    let (outcome, error) = match result {
        Ok(outcome) => {
            info!(
                "✓ 会话完成: {} 页, {} 条记录, 跳过重复 {} 条",
                outcome.pages_visited,
                records.len(),
                duplicates_skipped
            );
            (Some(outcome), None)
        }
        Err(e) => {
            error!("❌ 会话被中断，保留已收集的 {} 条记录: {}", records.len(), e);
            (None, Some(e))
        }
    };

    SessionRun {
        session,
        records,
        outcome,
        duplicates_skipped,
        error,
    }
}
