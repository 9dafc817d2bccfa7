use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 分类标签
///
/// 内置一组固定标签，也允许调用方自定义。一条记录可以同时拥有多个标签。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryLabel {
    /// 波士顿地区的 AI 职位
    BostonAI,
    /// 波士顿以外的美国 AI 职位
    OtherUSAI,
    /// Corp-to-Corp 合同职位
    C2C,
    /// 波士顿地区
    Boston,
    /// 其他州
    OtherState,
    /// AI / 机器学习
    AI,
    /// 分析师
    Analyst,
    /// 自定义标签
    Custom(String),
}

impl CategoryLabel {
    /// 获取标签名称
    pub fn as_str(&self) -> &str {
        match self {
            CategoryLabel::BostonAI => "BostonAI",
            CategoryLabel::OtherUSAI => "OtherUSAI",
            CategoryLabel::C2C => "C2C",
            CategoryLabel::Boston => "Boston",
            CategoryLabel::OtherState => "OtherState",
            CategoryLabel::AI => "AI",
            CategoryLabel::Analyst => "Analyst",
            CategoryLabel::Custom(name) => name,
        }
    }

    /// 从名称解析标签，未知名称成为自定义标签
    pub fn from_name(name: &str) -> Self {
        match name {
            "BostonAI" => CategoryLabel::BostonAI,
            "OtherUSAI" => CategoryLabel::OtherUSAI,
            "C2C" => CategoryLabel::C2C,
            "Boston" => CategoryLabel::Boston,
            "OtherState" => CategoryLabel::OtherState,
            "AI" => CategoryLabel::AI,
            "Analyst" => CategoryLabel::Analyst,
            other => CategoryLabel::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 以字符串形式序列化，便于作为 JSON 对象的键
impl Serialize for CategoryLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(CategoryLabel::from_name(&name))
    }
}
