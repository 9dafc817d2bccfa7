pub mod connection;
pub mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

use anyhow::Result;
use chromiumoxide::Browser;

use crate::config::{BrowserMode, Config};

/// 按配置连接或启动浏览器
pub async fn open_browser(config: &Config) -> Result<Browser> {
    match config.browser_mode {
        BrowserMode::Connect => connect_to_browser(config.browser_debug_port).await,
        BrowserMode::Headless => launch_headless_browser(config.chrome_executable.as_deref()).await,
    }
}
