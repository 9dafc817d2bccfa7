use serde::{Deserialize, Serialize};

use crate::models::category::CategoryLabel;

/// 规则可以读取的记录字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Title,
    Company,
    Location,
    /// 详情页描述
    Description,
    /// 卡片完整文本
    Body,
}

/// 规则谓词
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePredicate {
    /// 在若干字段拼接后的文本上做大小写不敏感的正则匹配
    Text {
        fields: Vec<RecordField>,
        pattern: String,
    },
    /// 对原始地点字符串做白名单式匹配；没有地点时永不命中（取反也一样）
    Location {
        pattern: String,
        #[serde(default)]
        negate: bool,
    },
    /// 全部满足
    All { of: Vec<RulePredicate> },
}

/// 一条分类规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: CategoryLabel,
    pub predicate: RulePredicate,
}

/// 有序规则集
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, rename = "rule")]
    pub rules: Vec<CategoryRule>,
}

const AI_PATTERN: &str = r"\b(ai|ml|machine learning|artificial intelligence|deep learning|nlp|generative ai|data scientist)\b";
const BOSTON_PATTERN: &str = r"boston|massachusetts|\bma\b";
const C2C_PATTERN: &str = r"\bc2c\b|corp\s*-?\s*to\s*-?\s*corp";

impl RuleSet {
    /// 默认规则集
    pub fn builtin() -> Self {
        let ai = RulePredicate::Text {
            fields: vec![RecordField::Title, RecordField::Description, RecordField::Body],
            pattern: AI_PATTERN.to_string(),
        };
        let boston = RulePredicate::Location {
            pattern: BOSTON_PATTERN.to_string(),
            negate: false,
        };
        let other_state = RulePredicate::Location {
            pattern: BOSTON_PATTERN.to_string(),
            negate: true,
        };

        let rules = vec![
            CategoryRule {
                label: CategoryLabel::BostonAI,
                predicate: RulePredicate::All {
                    of: vec![ai.clone(), boston.clone()],
                },
            },
            CategoryRule {
                label: CategoryLabel::OtherUSAI,
                predicate: RulePredicate::All {
                    of: vec![ai.clone(), other_state.clone()],
                },
            },
            CategoryRule {
                label: CategoryLabel::C2C,
                predicate: RulePredicate::Text {
                    fields: vec![RecordField::Title, RecordField::Body, RecordField::Description],
                    pattern: C2C_PATTERN.to_string(),
                },
            },
            CategoryRule {
                label: CategoryLabel::Boston,
                predicate: boston,
            },
            CategoryRule {
                label: CategoryLabel::OtherState,
                predicate: other_state,
            },
            CategoryRule {
                label: CategoryLabel::AI,
                predicate: ai,
            },
            CategoryRule {
                label: CategoryLabel::Analyst,
                predicate: RulePredicate::Text {
                    fields: vec![RecordField::Title],
                    pattern: r"\banalyst\b".to_string(),
                },
            },
        ];

        Self { rules }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}
