pub mod category;
pub mod loaders;
pub mod record;
pub mod report;
pub mod rules;
pub mod session;
pub mod site;

pub use category::CategoryLabel;
pub use loaders::{load_crawl_plan, load_rule_set, load_site_profile};
pub use record::{ApplicationSignal, EnrichedRecord, RawRecord, TabularRow};
pub use report::AggregateReport;
pub use rules::{CategoryRule, RecordField, RulePredicate, RuleSet};
pub use session::{CrawlPlan, SearchSession};
pub use site::{DetailSelectors, ListingSelectors, ScrollSettings, SiteProfile, TextProbe};
