//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责计划调度和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 爬取计划处理器
//! - 管理应用生命周期（初始化、运行、输出）
//! - 加载站点配置、分类规则和爬取计划
//! - 管理浏览器资源（`PageFetcher`）
//! - 跨会话去重、汇总并写出报告
//!
//! ### `session_processor` - 单个会话处理器
//! - 为会话打开结果页
//! - 用 `PaginationController` 驱动 `CrawlFlow`
//! - 致命错误时仍交回已收集的记录
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SearchSession>)
//!     ↓
//! session_processor (处理一个会话的所有结果页)
//!     ↓
//! workflow::CrawlFlow (处理一页结果)
//!     ↓
//! services (能力层：extract / visit / dedup / classify)
//!     ↓
//! infrastructure (基础设施：BrowsingContext / PageFetcher)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管计划，session_processor 管单个会话
//! 2. **资源隔离**：只有编排层持有浏览器
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;
pub mod session_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use session_processor::{process_session, SessionRun};
