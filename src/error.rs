use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器能力层错误
    #[error("浏览器错误: {0}")]
    Driver(#[from] DriverError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输出错误
    #[error("输出错误: {0}")]
    Output(#[from] OutputError),
}

/// 浏览器能力层错误
///
/// 只有 [`DriverError::Disconnected`] 被视为致命错误，其余都只影响单页或单条记录。
#[derive(Debug, Error)]
pub enum DriverError {
    /// 浏览器连接中断（驱动崩溃、websocket 断开）
    #[error("浏览器连接已中断: {0}")]
    Disconnected(String),
    /// 等待超时
    #[error("等待 {what} 超时 ({timeout:?})")]
    Timeout { what: String, timeout: Duration },
    /// 导航失败
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },
    /// 元素操作失败
    #[error("元素操作失败: {0}")]
    Element(String),
    /// 截图失败
    #[error("截图失败: {0}")]
    Screenshot(String),
    /// 其他协议错误
    #[error("CDP 协议错误: {0}")]
    Protocol(String),
}

impl DriverError {
    /// 是否为能力层的致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Disconnected(_))
    }

    /// 创建超时错误
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        DriverError::Timeout {
            what: what.into(),
            timeout,
        }
    }

    /// 创建导航错误
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        DriverError::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 分类规则中的正则无法编译
    #[error("分类规则 {label} 的正则无效 '{pattern}': {source}")]
    InvalidRulePattern {
        label: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// 搜索地址模板无效
    #[error("搜索地址模板无效 '{template}': {source}")]
    InvalidSearchUrl {
        template: String,
        #[source]
        source: url::ParseError,
    },
    /// 环境变量取值无法识别
    #[error("环境变量 {var_name} 的值 '{value}' 无法识别，期望: {expected}")]
    UnknownValue {
        var_name: String,
        value: String,
        expected: String,
    },
}

/// 输出错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 序列化失败
    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
    /// CSV 写入失败
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),
}

// ========== 从 chromiumoxide 错误转换 ==========

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        match err {
            CdpError::Ws(e) => DriverError::Disconnected(e.to_string()),
            CdpError::ChannelSendError(e) => DriverError::Disconnected(e.to_string()),
            CdpError::Timeout => DriverError::Protocol("CDP 请求超时".to_string()),
            CdpError::NotFound => DriverError::Element("未找到元素".to_string()),
            other => DriverError::Protocol(other.to_string()),
        }
    }
}

// ========== Result 类型别名 ==========

/// 浏览器能力层结果类型
pub type DriverResult<T> = Result<T, DriverError>;
