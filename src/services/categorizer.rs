//! 分类服务 - 业务能力层
//!
//! 只负责给单条记录打标签，不关心流程

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;
use crate::models::{CategoryLabel, EnrichedRecord, RecordField, RulePredicate, RuleSet};

/// 编译后的谓词
#[derive(Debug)]
enum Matcher {
    Text { fields: Vec<RecordField>, regex: Regex },
    Location { regex: Regex, negate: bool },
    All(Vec<Matcher>),
}

impl Matcher {
    fn compile(label: &CategoryLabel, predicate: &RulePredicate) -> Result<Self, ConfigError> {
        Ok(match predicate {
            RulePredicate::Text { fields, pattern } => Matcher::Text {
                fields: fields.clone(),
                regex: build_regex(label, pattern)?,
            },
            RulePredicate::Location { pattern, negate } => Matcher::Location {
                regex: build_regex(label, pattern)?,
                negate: *negate,
            },
            RulePredicate::All { of } => Matcher::All(
                of.iter()
                    .map(|p| Matcher::compile(label, p))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    fn matches(&self, record: &EnrichedRecord) -> bool {
        match self {
            Matcher::Text { fields, regex } => regex.is_match(&combined_text(record, fields)),
            Matcher::Location { regex, negate } => match record.raw.location.as_deref() {
                Some(location) => regex.is_match(location) != *negate,
                None => false,
            },
            Matcher::All(matchers) => matchers.iter().all(|m| m.matches(record)),
        }
    }
}

fn build_regex(label: &CategoryLabel, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::InvalidRulePattern {
            label: label.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

/// 拼接所选字段的文本，缺失字段跳过
fn combined_text(record: &EnrichedRecord, fields: &[RecordField]) -> String {
    fields
        .iter()
        .filter_map(|field| match field {
            RecordField::Title => record.raw.title.as_deref(),
            RecordField::Company => record.raw.company.as_deref(),
            RecordField::Location => record.raw.location.as_deref(),
            RecordField::Description => record.description.as_deref(),
            RecordField::Body => Some(record.raw.body_text.as_str()),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 分类器
///
/// 规则互相独立、互不排斥，一条记录可以得到多个标签；结果与规则求值顺序无关。
#[derive(Debug)]
pub struct Categorizer {
    rules: Vec<(CategoryLabel, Matcher)>,
}

impl Categorizer {
    /// 编译规则集，任何一条正则无效都会返回错误
    pub fn new(rule_set: &RuleSet) -> Result<Self, ConfigError> {
        let rules = rule_set
            .rules
            .iter()
            .map(|rule| Ok((rule.label.clone(), Matcher::compile(&rule.label, &rule.predicate)?)))
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// 返回记录命中的全部标签（去重，按规则顺序）
    pub fn classify(&self, record: &EnrichedRecord) -> Vec<CategoryLabel> {
        let mut labels: Vec<CategoryLabel> = Vec::new();
        for (label, matcher) in &self.rules {
            if !labels.contains(label) && matcher.matches(record) {
                labels.push(label.clone());
            }
        }
        labels
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
