//! # Job Crawl
//!
//! 一个用于爬取分页职位列表、访问详情页并分类汇总的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器），只暴露能力
//! - `BrowsingContext` / `PageFetcher` - 导航、查询元素、截图、隔离上下文
//! - `ChromeFetcher` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `PaginationController` - 翻页（URL 参数 / 下一页按钮）
//! - `RecordExtractor` - 从结果页提取卡片
//! - `DetailVisitor` - 在隔离上下文中访问详情页
//! - `Deduplicator` / `Categorizer` / `Aggregator` - 去重、分类、汇总
//! - `ReportSink` - 写 JSON / CSV
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一页结果"的完整处理流程
//! - `CrawlCtx` - 会话上下文（会话 + 去重集合 + 已收集记录）
//! - `CrawlFlow` - 流程编排（extract → dedup → visit → classify）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 爬取计划处理器，管理资源和输出
//! - `orchestrator/session_processor` - 单个会话处理器，驱动翻页
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, CrawlOptions};
pub use error::{AppError, DriverError, DriverResult};
pub use infrastructure::{BrowsingContext, ChromeFetcher, PageFetcher};
pub use models::{AggregateReport, CategoryLabel, CrawlPlan, EnrichedRecord, SearchSession, SiteProfile};
pub use orchestrator::{process_session, App, SessionRun};
pub use workflow::{CrawlCtx, CrawlFlow};
