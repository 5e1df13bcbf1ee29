//! ParamSource adapters.
//!
//! - `PageUrlParams` - Query string of a (replaceable) navigation URL
//! - `StaticParams` - Fixed values

mod fixed;
mod page_url;

pub use fixed::StaticParams;
pub use page_url::PageUrlParams;
