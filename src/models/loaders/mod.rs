pub mod toml_loader;

pub use toml_loader::{load_crawl_plan, load_rule_set, load_site_profile};
