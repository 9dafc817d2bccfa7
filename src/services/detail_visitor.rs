//! 详情页访问服务 - 业务能力层
//!
//! 每条记录在独立的浏览上下文中访问，任何单条记录的失败都只记录在该记录上。
//!
//! 访问步骤（彼此独立、失败不致命）：
//! 1. 打开隔离上下文并导航
//! 2. 关闭 Cookie 提示
//! 3. 按回退列表提取描述、发布时间，补齐卡片上缺失的标题/公司/地点
//! 4. 探测一键申请按钮；没有描述时探测登录墙
//! 5. 截图留档
//! 6. 释放上下文

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::DriverResult;
use crate::infrastructure::{
    any_present, find_by_text, first_text, BrowsingContext, PageFetcher, WaitPolicy,
};
use crate::models::{ApplicationSignal, EnrichedRecord, RawRecord, SiteProfile, TextProbe};
use crate::utils::truncate_text;

/// 当前访问的记录位置，用于日志和截图命名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitCtx {
    pub page_index: u32,
    /// 在本页中的序号（从 0 开始）
    pub item_index: usize,
}

impl std::fmt::Display for VisitCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[第{}页 #{}]", self.page_index, self.item_index + 1)
    }
}

/// 详情页访问器
pub struct DetailVisitor<'a> {
    fetcher: &'a dyn PageFetcher,
    profile: &'a SiteProfile,
    screenshot_dir: PathBuf,
}

impl<'a> DetailVisitor<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, profile: &'a SiteProfile, screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            profile,
            screenshot_dir: screenshot_dir.into(),
        }
    }

    /// 访问一条记录的详情页
    ///
    /// 只有在浏览器本身不可用（致命错误）时返回 Err，其余问题都写进记录的
    /// `visit_error` 或缺失字段。
    pub async fn visit(&self, raw: &RawRecord, ctx: VisitCtx) -> DriverResult<EnrichedRecord> {
        let mut record = EnrichedRecord::unvisited(raw.clone());
        let Some(link) = raw.link.as_deref() else {
            debug!("{} 没有链接，跳过详情页", ctx);
            return Ok(record);
        };

        let context = match self.fetcher.open_isolated().await {
            Ok(context) => context,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{} ⚠️ 无法打开新的浏览上下文: {}", ctx, e);
                record.visit_error = Some(e.to_string());
                return Ok(record);
            }
        };

        let inspected = self.inspect(context.as_ref(), link, ctx, &mut record).await;

        // 无论前面是否成功都截图
        record.diagnostic_artifact = self.capture(context.as_ref(), ctx).await;

        if let Err(e) = context.close().await {
            debug!("{} 关闭上下文失败: {}", ctx, e);
        }

        inspected.map(|()| record)
    }

    async fn inspect(
        &self,
        context: &dyn BrowsingContext,
        link: &str,
        ctx: VisitCtx,
        record: &mut EnrichedRecord,
    ) -> DriverResult<()> {
        info!("{} 🔗 访问详情页: {}", ctx, link);
        let navigation_failed = match context.navigate(link, WaitPolicy::NetworkIdle).await {
            Ok(()) => false,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("{} ⚠️ 导航失败，继续处理已加载的内容: {}", ctx, e);
                record.visit_error = Some(e.to_string());
                true
            }
        };

        let detail = &self.profile.detail;

        step(dismiss_consent(context, &self.profile.consent).await, ctx, "关闭 Cookie 提示")?;
        record.description = step(first_text(context, &detail.description).await, ctx, "提取描述")?.flatten();
        record.posted_at = step(first_text(context, &detail.posted_at).await, ctx, "提取发布时间")?.flatten();
        if let Some(description) = &record.description {
            debug!("{} 描述: {}", ctx, truncate_text(description, 80));
        }

        // 只补缺失字段，卡片上已有的值保持不变
        if record.raw.title.is_none() {
            record.raw.title = step(first_text(context, &detail.title).await, ctx, "提取标题")?.flatten();
        }
        if record.raw.company.is_none() {
            record.raw.company = step(first_text(context, &detail.company).await, ctx, "提取公司")?.flatten();
        }
        if record.raw.location.is_none() {
            record.raw.location = step(first_text(context, &detail.location).await, ctx, "提取地点")?.flatten();
        }

        let apply = &detail.apply;
        let apply_found = step(
            find_by_text(context, &apply.selector, |text| apply.matches(text)).await,
            ctx,
            "探测申请按钮",
        )?
        .flatten()
        .is_some();

        let gated = record.description.is_none()
            && step(any_present(context, &detail.gate).await, ctx, "探测登录墙")? == Some(true);

        let resolved_anything = record.description.is_some() || record.posted_at.is_some();
        record.application_signal = decide_signal(navigation_failed, gated, apply_found, resolved_anything);
        info!("{} ✓ {}", ctx, record.application_signal.name());

        Ok(())
    }

    /// 截图，失败时返回 None
    async fn capture(&self, context: &dyn BrowsingContext, ctx: VisitCtx) -> Option<String> {
        if let Err(e) = tokio::fs::create_dir_all(&self.screenshot_dir).await {
            debug!("{} 无法创建截图目录: {}", ctx, e);
            return None;
        }

        let path = self.screenshot_path(ctx);
        match context.screenshot(&path, true).await {
            Ok(()) => Some(path.to_string_lossy().to_string()),
            Err(e) => {
                debug!("{} 截图失败: {}", ctx, e);
                None
            }
        }
    }

    fn screenshot_path(&self, ctx: VisitCtx) -> PathBuf {
        let file = format!(
            "screenshot_page{}_job{}_{}.png",
            ctx.page_index,
            ctx.item_index + 1,
            chrono::Utc::now().timestamp_millis()
        );
        Path::new(&self.screenshot_dir).join(file)
    }
}

/// 关闭 Cookie 同意提示，返回是否点击了按钮
pub async fn dismiss_consent(context: &dyn BrowsingContext, probe: &TextProbe) -> DriverResult<bool> {
    match find_by_text(context, &probe.selector, |text| probe.matches(text)).await? {
        Some(button) => {
            button.click().await?;
            debug!("已关闭 Cookie 提示");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// 单个步骤的非致命错误只记日志
fn step<T>(result: DriverResult<T>, ctx: VisitCtx, action: &str) -> DriverResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!("{} {}失败: {}", ctx, action, e);
            Ok(None)
        }
    }
}

/// 根据探测结果确定申请方式
fn decide_signal(
    navigation_failed: bool,
    gated: bool,
    apply_found: bool,
    resolved_anything: bool,
) -> ApplicationSignal {
    if gated {
        ApplicationSignal::Gated
    } else if apply_found {
        ApplicationSignal::EasyApply
    } else if navigation_failed && !resolved_anything {
        ApplicationSignal::Unvisited
    } else {
        ApplicationSignal::NoEasyApply
    }
}
