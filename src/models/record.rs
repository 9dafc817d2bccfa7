use serde::{Deserialize, Serialize};

use crate::models::category::CategoryLabel;

/// 结果页上一张职位卡片的原始数据
///
/// `link` 是记录的身份标识；没有链接的记录无法去重，总被视为唯一。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub link: Option<String>,
    /// 卡片的完整文本，供后续分类（如合同类型）使用
    #[serde(default)]
    pub body_text: String,
}

/// 申请方式信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationSignal {
    /// 页面上有一键申请按钮
    EasyApply,
    /// 访问成功但没有一键申请
    NoEasyApply,
    /// 需要登录才能查看
    Gated,
    /// 未访问详情页
    Unvisited,
}

impl ApplicationSignal {
    /// 获取输出用名称
    pub fn name(self) -> &'static str {
        match self {
            ApplicationSignal::EasyApply => "Easy Apply",
            ApplicationSignal::NoEasyApply => "No Easy Apply",
            ApplicationSignal::Gated => "Gated",
            ApplicationSignal::Unvisited => "Unvisited",
        }
    }
}

/// 经过详情页补充后的记录
///
/// 由 `RawRecord` 生成的新值，原始记录保持不变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub raw: RawRecord,
    pub description: Option<String>,
    pub posted_at: Option<String>,
    pub application_signal: ApplicationSignal,
    /// 诊断截图路径
    pub diagnostic_artifact: Option<String>,
    pub visit_error: Option<String>,
    // --- 来源信息 ---
    #[serde(default)]
    pub search_keyword: String,
    #[serde(default)]
    pub search_location: String,
    #[serde(default)]
    pub page_index: u32,
    #[serde(default)]
    pub categories: Vec<CategoryLabel>,
}

impl EnrichedRecord {
    /// 未访问详情页时直接由原始记录生成
    pub fn unvisited(raw: RawRecord) -> Self {
        Self {
            raw,
            description: None,
            posted_at: None,
            application_signal: ApplicationSignal::Unvisited,
            diagnostic_artifact: None,
            visit_error: None,
            search_keyword: String::new(),
            search_location: String::new(),
            page_index: 0,
            categories: Vec::new(),
        }
    }

    /// 记录的身份标识
    pub fn link(&self) -> Option<&str> {
        self.raw.link.as_deref()
    }

    /// 是否带有某个标签
    pub fn has_label(&self, label: &CategoryLabel) -> bool {
        self.categories.contains(label)
    }
}

/// CSV 导出用的扁平行，只含标量字段
#[derive(Debug, Clone, Serialize)]
pub struct TabularRow {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub posted_at: String,
    pub application_signal: &'static str,
    pub categories: String,
    pub search_keyword: String,
    pub search_location: String,
    pub page_index: u32,
    pub screenshot: String,
    pub visit_error: String,
    pub description: String,
}

impl From<&EnrichedRecord> for TabularRow {
    fn from(record: &EnrichedRecord) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            title: text(&record.raw.title),
            company: text(&record.raw.company),
            location: text(&record.raw.location),
            link: text(&record.raw.link),
            posted_at: text(&record.posted_at),
            application_signal: record.application_signal.name(),
            categories: record
                .categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            search_keyword: record.search_keyword.clone(),
            search_location: record.search_location.clone(),
            page_index: record.page_index,
            screenshot: text(&record.diagnostic_artifact),
            visit_error: text(&record.visit_error),
            // 没有详情描述时退回卡片文本
            description: record
                .description
                .clone()
                .unwrap_or_else(|| record.raw.body_text.clone()),
        }
    }
}
