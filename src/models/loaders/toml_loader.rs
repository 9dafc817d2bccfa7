use crate::models::rules::RuleSet;
use crate::models::session::CrawlPlan;
use crate::models::site::SiteProfile;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;

/// 读取并解析一个 TOML 文件
async fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("无法解析TOML文件: {}", path.display()))
}

/// 加载站点配置，未指定路径时使用 Dice 默认配置
pub async fn load_site_profile(path: Option<&str>) -> Result<SiteProfile> {
    match path {
        Some(path) => {
            let profile: SiteProfile = load_toml(Path::new(path)).await?;
            tracing::info!("已加载站点配置: {} ({})", profile.name, path);
            Ok(profile)
        }
        None => Ok(SiteProfile::default()),
    }
}

/// 加载分类规则，未指定路径时使用内置规则
pub async fn load_rule_set(path: Option<&str>) -> Result<RuleSet> {
    match path {
        Some(path) => {
            let rules: RuleSet = load_toml(Path::new(path)).await?;
            tracing::info!("已加载 {} 条分类规则: {}", rules.rules.len(), path);
            Ok(rules)
        }
        None => Ok(RuleSet::builtin()),
    }
}

/// 加载爬取计划
pub async fn load_crawl_plan(path: &str) -> Result<CrawlPlan> {
    let path = Path::new(path);
    if !path.exists() {
        anyhow::bail!("计划文件不存在: {}", path.display());
    }

    let plan: CrawlPlan = load_toml(path).await?;
    if plan.sessions.is_empty() {
        tracing::warn!("计划文件中没有任何会话: {}", path.display());
    } else {
        tracing::info!("成功加载 {} 个搜索会话", plan.sessions.len());
    }

    Ok(plan)
}
