pub mod crawl_ctx;
pub mod crawl_flow;

pub use crawl_ctx::CrawlCtx;
pub use crawl_flow::CrawlFlow;
