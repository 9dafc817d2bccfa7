use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{AggregateReport, SearchSession};

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug 或 info 级别。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("job_crawl={},warn", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n职位爬取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 向日志文件追加一行
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(site: &str, session_count: usize, visit_details: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 职位爬取");
    info!("🌐 站点: {}", site);
    info!("📋 搜索会话: {} 个", session_count);
    info!("🔗 访问详情页: {}", if visit_details { "是" } else { "否" });
    info!("{}", "=".repeat(60));
}

/// 记录会话开始信息
///
/// # 参数
/// - `index`: 会话编号（从 1 开始）
/// - `total`: 会话总数
/// - `session`: 会话
pub fn log_session_start(index: usize, total: usize, session: &SearchSession) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始第 {}/{} 个会话 {}", index, total, session);
    info!("{}", "=".repeat(60));
}

/// 记录会话完成信息
pub fn log_session_complete(index: usize, pages: u32, records: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 个会话完成: {} 页, {} 条记录", index, pages, records);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &AggregateReport, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 共收集: {}", report.total_collected);
    for (label, count) in report.summary() {
        info!("   - {}: {}", label, count);
    }
    if report.partial {
        info!("⚠️ 运行被中断，以上为部分结果");
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
