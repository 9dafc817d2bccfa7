use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::SiteProfile;

/// 浏览器来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserMode {
    /// 连接到已开启调试端口的浏览器
    Connect,
    /// 自行启动无头浏览器
    Headless,
}

impl FromStr for BrowserMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "connect" => Ok(BrowserMode::Connect),
            "headless" => Ok(BrowserMode::Headless),
            _ => Err(unknown("BROWSER_MODE", s, "connect | headless")),
        }
    }
}

/// 翻页方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// 构造带页码（或结果偏移）参数的地址
    UrlParameter,
    /// 点击"下一页"控件
    #[default]
    NextControl,
    /// 在同一页中滚动加载更多结果
    Scroll,
}

impl FromStr for PaginationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "url" => Ok(PaginationMode::UrlParameter),
            "next" => Ok(PaginationMode::NextControl),
            "scroll" => Ok(PaginationMode::Scroll),
            _ => Err(unknown("PAGINATION_MODE", s, "url | next | scroll")),
        }
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Both,
}

impl OutputFormat {
    pub fn wants_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn wants_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "both" => Ok(OutputFormat::Both),
            _ => Err(unknown("OUTPUT_FORMAT", s, "json | csv | both")),
        }
    }
}

fn unknown(var_name: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::UnknownValue {
        var_name: var_name.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 浏览器 ---
    pub browser_mode: BrowserMode,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    pub chrome_executable: Option<String>,
    // --- 站点与规则 ---
    /// 站点配置 TOML，未设置时使用 Dice 默认配置
    pub site_profile_path: Option<String>,
    /// 分类规则 TOML，未设置时使用内置规则
    pub category_rules_path: Option<String>,
    /// 爬取计划 TOML，未设置时使用下面的单个会话
    pub plan_path: Option<String>,
    pub search_keyword: String,
    pub search_location: String,
    pub max_pages: u32,
    // --- 爬取行为 ---
    /// 未设置时使用站点配置中的翻页方式
    pub pagination_mode: Option<PaginationMode>,
    /// 是否访问详情页
    pub visit_details: bool,
    /// 同时进行的详情页访问数量
    pub detail_concurrency: usize,
    /// 每页最多处理的记录数
    pub max_items_per_page: Option<usize>,
    /// 只保留链接中包含该子串的记录，覆盖站点配置
    pub link_filter: Option<String>,
    pub item_delay: Duration,
    pub page_delay: Duration,
    pub listing_timeout: Duration,
    pub navigation_timeout: Duration,
    // --- 输出 ---
    pub output_dir: String,
    pub output_format: OutputFormat,
    pub screenshot_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,
    /// 读取环境变量时遇到的无效值，日志初始化后再输出
    pub env_warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_mode: BrowserMode::Headless,
            browser_debug_port: 9222,
            chrome_executable: None,
            site_profile_path: None,
            category_rules_path: None,
            plan_path: None,
            search_keyword: "Data Analyst".to_string(),
            search_location: "Boston, MA".to_string(),
            max_pages: 5,
            pagination_mode: None,
            visit_details: false,
            detail_concurrency: 1,
            max_items_per_page: None,
            link_filter: None,
            item_delay: Duration::from_millis(300),
            page_delay: Duration::from_millis(500),
            listing_timeout: Duration::from_secs(20),
            navigation_timeout: Duration::from_secs(60),
            output_dir: "output".to_string(),
            output_format: OutputFormat::Both,
            screenshot_dir: "screenshots".to_string(),
            verbose_logging: false,
            output_log_file: "crawl_log.txt".to_string(),
            env_warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        let mut env = EnvReader::default();
        let mut config = Self {
            browser_mode: env.parsed("BROWSER_MODE").unwrap_or(default.browser_mode),
            browser_debug_port: env.parsed("BROWSER_DEBUG_PORT").unwrap_or(default.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            site_profile_path: std::env::var("SITE_PROFILE").ok().or(default.site_profile_path),
            category_rules_path: std::env::var("CATEGORY_RULES").ok().or(default.category_rules_path),
            plan_path: std::env::var("CRAWL_PLAN").ok().or(default.plan_path),
            search_keyword: std::env::var("SEARCH_KEYWORD").unwrap_or(default.search_keyword),
            search_location: std::env::var("SEARCH_LOCATION").unwrap_or(default.search_location),
            max_pages: env.parsed("MAX_PAGES").unwrap_or(default.max_pages),
            pagination_mode: env.parsed("PAGINATION_MODE").or(default.pagination_mode),
            visit_details: env.parsed("VISIT_DETAILS").unwrap_or(default.visit_details),
            detail_concurrency: env
                .parsed::<usize>("DETAIL_CONCURRENCY")
                .unwrap_or(default.detail_concurrency)
                .max(1),
            max_items_per_page: env.parsed("MAX_ITEMS_PER_PAGE").or(default.max_items_per_page),
            link_filter: std::env::var("LINK_FILTER").ok().or(default.link_filter),
            item_delay: env.millis("ITEM_DELAY_MS").unwrap_or(default.item_delay),
            page_delay: env.millis("PAGE_DELAY_MS").unwrap_or(default.page_delay),
            listing_timeout: env.millis("LISTING_TIMEOUT_MS").unwrap_or(default.listing_timeout),
            navigation_timeout: env.millis("NAVIGATION_TIMEOUT_MS").unwrap_or(default.navigation_timeout),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            output_format: env.parsed("OUTPUT_FORMAT").unwrap_or(default.output_format),
            screenshot_dir: std::env::var("SCREENSHOT_DIR").unwrap_or(default.screenshot_dir),
            verbose_logging: env.parsed("VERBOSE_LOGGING").unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            env_warnings: Vec::new(),
        };
        config.env_warnings = env.warnings;
        config
    }
}

/// 单个会话的爬取行为参数
#[derive(Clone, Debug)]
pub struct CrawlOptions {
    /// 未设置时使用站点配置中的翻页方式
    pub pagination_mode: Option<PaginationMode>,
    pub visit_details: bool,
    pub detail_concurrency: usize,
    pub max_items_per_page: Option<usize>,
    pub link_filter: Option<String>,
    pub item_delay: Duration,
    pub page_delay: Duration,
    pub listing_timeout: Duration,
    /// 翻页后等待页面内容变化的上限
    pub navigation_timeout: Duration,
    pub screenshot_dir: String,
}

impl CrawlOptions {
    /// 本站点实际使用的翻页方式
    pub fn pagination_for(&self, profile: &SiteProfile) -> PaginationMode {
        self.pagination_mode.unwrap_or(profile.pagination)
    }

    /// 本站点实际使用的链接过滤条件
    pub fn link_filter_for<'a>(&'a self, profile: &'a SiteProfile) -> Option<&'a str> {
        self.link_filter.as_deref().or(profile.link_filter.as_deref())
    }
}

impl From<&Config> for CrawlOptions {
    fn from(config: &Config) -> Self {
        Self {
            pagination_mode: config.pagination_mode,
            visit_details: config.visit_details,
            detail_concurrency: config.detail_concurrency.max(1),
            max_items_per_page: config.max_items_per_page,
            link_filter: config.link_filter.clone(),
            item_delay: config.item_delay,
            page_delay: config.page_delay,
            listing_timeout: config.listing_timeout,
            navigation_timeout: config.navigation_timeout,
            screenshot_dir: config.screenshot_dir.clone(),
        }
    }
}

/// 读取并解析环境变量
///
/// 无法解析的值回退默认值，并记入 `warnings`；此时日志可能尚未初始化。
#[derive(Debug, Default)]
struct EnvReader {
    warnings: Vec<String>,
}

impl EnvReader {
    fn parsed<T>(&mut self, var_name: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = std::env::var(var_name).ok()?;
        self.parse_value(var_name, &value)
    }

    fn millis(&mut self, var_name: &str) -> Option<Duration> {
        self.parsed(var_name).map(Duration::from_millis)
    }

    fn parse_value<T>(&mut self, var_name: &str, value: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match value.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                self.warnings
                    .push(format!("环境变量 {}='{}' 无效，使用默认值: {}", var_name, value, e));
                None
            }
        }
    }
}
