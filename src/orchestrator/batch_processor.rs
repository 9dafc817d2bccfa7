//! 爬取计划处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责整个爬取计划的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志文件、加载站点配置/分类规则/爬取计划、连接浏览器
//! 2. **顺序执行**：逐个会话调用 `session_processor`，会话之间不并发
//! 3. **计划级去重**：不同会话找到的同一链接只保留第一次出现的记录
//! 4. **部分结果**：遇到致命错误停止后续会话，但已收集的记录仍然汇总输出
//! 5. **报告输出**：按配置写 JSON / CSV，并输出全局统计
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单页和单条记录的细节
//! - **资源所有者**：唯一持有浏览器（通过 `PageFetcher`）的模块
//! - **向下委托**：委托 session_processor 处理单个会话

use anyhow::Result;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::{Config, CrawlOptions};
use crate::infrastructure::{ChromeFetcher, PageFetcher};
use crate::models::{
    load_crawl_plan, load_rule_set, load_site_profile, AggregateReport, CrawlPlan, EnrichedRecord,
    SearchSession, SiteProfile,
};
use crate::orchestrator::session_processor::{self, SessionRun};
use crate::services::{Aggregator, Categorizer, Deduplicator, ReportSink};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    fetcher: Box<dyn PageFetcher>,
    profile: SiteProfile,
    categorizer: Categorizer,
    plan: CrawlPlan,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        let profile = load_site_profile(config.site_profile_path.as_deref()).await?;
        let rules = load_rule_set(config.category_rules_path.as_deref()).await?;
        let categorizer = Categorizer::new(&rules)?;
        info!("📐 已加载 {} 条分类规则", categorizer.rule_count());
        let plan = match config.plan_path.as_deref() {
            Some(path) => load_crawl_plan(path).await?,
            None => CrawlPlan::single(SearchSession::new(
                config.search_keyword.as_str(),
                config.search_location.as_str(),
                config.max_pages,
            )),
        };

        logging::log_startup(&profile.name, plan.sessions.len(), config.visit_details);

        // 连接浏览器
        let browser = browser::open_browser(&config).await?;
        let fetcher = ChromeFetcher::new(browser, config.navigation_timeout);

        Ok(Self::with_fetcher(config, Box::new(fetcher), profile, categorizer, plan))
    }

    /// 使用现成的页面获取能力组装应用（不连接浏览器）
    pub fn with_fetcher(
        config: Config,
        fetcher: Box<dyn PageFetcher>,
        profile: SiteProfile,
        categorizer: Categorizer,
        plan: CrawlPlan,
    ) -> Self {
        Self {
            config,
            fetcher,
            profile,
            categorizer,
            plan,
        }
    }

    /// 运行应用主逻辑：爬取 → 输出报告 → 统计
    ///
    /// 报告写入失败时返回错误；爬取被中断时仍然返回报告（`partial = true`）。
    pub async fn run(&self) -> Result<AggregateReport> {
        if self.plan.sessions.is_empty() {
            warn!("⚠️ 爬取计划中没有会话，程序结束");
        }

        let report = self.crawl().await;
        self.write_outputs(&report)?;

        logging::print_final_stats(&report, &self.config.output_log_file);
        self.append_summary(&report);

        Ok(report)
    }

    /// 顺序执行计划中的全部会话并汇总
    pub async fn crawl(&self) -> AggregateReport {
        let options = CrawlOptions::from(&self.config);
        let total = self.plan.sessions.len();
        let mut seen = Deduplicator::new();
        let mut records: Vec<EnrichedRecord> = Vec::new();
        let mut partial = false;

        for (idx, session) in self.plan.sessions.iter().enumerate() {
            logging::log_session_start(idx + 1, total, session);

            let run = session_processor::process_session(
                self.fetcher.as_ref(),
                &self.profile,
                &self.categorizer,
                &options,
                session.clone(),
            )
            .await;

            let kept = merge_records(&mut seen, &mut records, &run);
            logging::log_session_complete(idx + 1, run.pages_visited(), kept);

            if run.is_fatal() {
                error!("❌ 浏览器不可用，停止剩余 {} 个会话", total - idx - 1);
                partial = true;
                break;
            }
            if let Some(e) = &run.error {
                warn!("⚠️ 会话 {} 未完成: {}", session, e);
            }
        }

        Aggregator::aggregate(records, partial)
    }

    fn write_outputs(&self, report: &AggregateReport) -> Result<()> {
        let sink = ReportSink::new(self.config.output_dir.as_str());
        let slug = plan_slug(&self.plan);
        let format = self.config.output_format;

        if format.wants_json() {
            sink.write_json(report, &format!("{}_categorized", slug))?;
        }
        if format.wants_csv() {
            sink.write_csv(report, &format!("jobs_{}", slug))?;
        }
        Ok(())
    }

    fn append_summary(&self, report: &AggregateReport) {
        let mut lines = vec![format!(
            "[{}] 共收集 {} 条{}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S"),
            report.total_collected,
            if report.partial { "（部分结果）" } else { "" }
        )];
        lines.extend(
            report
                .summary()
                .into_iter()
                .map(|(label, count)| format!("  {}: {}", label, count)),
        );

        for line in lines {
            if let Err(e) = logging::append_log_line(&self.config.output_log_file, &line) {
                warn!("写入日志文件失败: {}", e);
                break;
            }
        }
    }
}

/// 合并会话记录，跳过之前会话已出现的链接；返回本会话保留的数量
fn merge_records(
    seen: &mut Deduplicator,
    records: &mut Vec<EnrichedRecord>,
    run: &SessionRun,
) -> usize {
    let before = records.len();
    for record in &run.records {
        if seen.admit(record.link()) {
            records.push(record.clone());
        }
    }
    let kept = records.len() - before;
    if kept < run.records.len() {
        info!("🔁 与之前会话重复 {} 条，已跳过", run.records.len() - kept);
    }
    kept
}

/// 输出文件名前缀：单会话用关键词，多会话用 `plan`
fn plan_slug(plan: &CrawlPlan) -> String {
    match plan.sessions.as_slice() {
        [session] => {
            let slug: String = session
                .keyword
                .trim()
                .to_lowercase()
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect();
            if slug.is_empty() {
                "search".to_string()
            } else {
                slug
            }
        }
        _ => "plan".to_string(),
    }
}
