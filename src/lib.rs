//! reviewfeed library exports

use std::sync::Arc;

use log::info;

pub mod api;
pub mod core;
pub mod seo;

#[cfg(test)]
pub mod test_support;

use crate::api::{FeedSource, HttpFeedSource, MockFeedSource};
use crate::core::config::ResolvedConfig;

/// Build the upstream source from a resolved config.
///
/// Mock data wins when enabled. Otherwise the HTTP source is used even
/// without a base URL; it then fails every call softly and feeds render empty.
pub fn build_source(config: &ResolvedConfig) -> Arc<dyn FeedSource> {
    if config.use_mock_data {
        info!("Using mock data source");
        return Arc::new(MockFeedSource::default());
    }
    Arc::new(HttpFeedSource::new(config.api_base_url.clone()))
}
