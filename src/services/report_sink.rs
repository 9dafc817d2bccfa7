//! 报告输出服务 - 业务能力层
//!
//! 只负责把汇总报告写成文件，不关心报告怎么来的

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::OutputError;
use crate::models::{AggregateReport, TabularRow};

/// 报告写入器
pub struct ReportSink {
    output_dir: PathBuf,
}

impl ReportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 写入 JSON 报告，返回文件路径
    pub fn write_json(&self, report: &AggregateReport, stem: &str) -> Result<PathBuf, OutputError> {
        let path = self.target(stem, "json")?;
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(|source| write_failed(&path, source))?;
        info!("💾 JSON 报告已保存: {}", path.display());
        Ok(path)
    }

    /// 写入扁平 CSV，返回文件路径
    pub fn write_csv(&self, report: &AggregateReport, stem: &str) -> Result<PathBuf, OutputError> {
        let path = self.target(stem, "csv")?;
        let mut writer = csv::Writer::from_path(&path)?;
        for record in &report.all_records {
            writer.serialize(TabularRow::from(record))?;
        }
        writer.flush().map_err(|source| write_failed(&path, source))?;
        info!("💾 CSV 已保存 ({} 行): {}", report.all_records.len(), path.display());
        Ok(path)
    }

    fn target(&self, stem: &str, extension: &str) -> Result<PathBuf, OutputError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| write_failed(&self.output_dir, source))?;
        let timestamp = report_timestamp();
        Ok(self.output_dir.join(format!("{}_{}.{}", stem, timestamp, extension)))
    }
}

fn report_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

fn write_failed(path: &Path, source: std::io::Error) -> OutputError {
    OutputError::WriteFailed {
        path: path.display().to_string(),
        source,
    }
}
