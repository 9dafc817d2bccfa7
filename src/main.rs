use anyhow::{bail, Result};
use tracing::warn;

use job_crawl::utils::logging;
use job_crawl::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志，再补记读取配置时遇到的无效值
    logging::init(config.verbose_logging);
    for warning in &config.env_warnings {
        warn!("⚠️ {}", warning);
    }

    // 初始化并运行应用
    let report = App::initialize(config).await?.run().await?;

    if report.partial {
        bail!("浏览器连接中断，只输出了部分结果");
    }

    Ok(())
}
