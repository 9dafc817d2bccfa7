pub mod capability;
pub mod chromium;

pub use capability::{
    any_present, find_by_text, first_text, BrowsingContext, DomElement, ElementHandle, PageFetcher, WaitPolicy,
};
pub use chromium::ChromeFetcher;
