use log::warn;
use reqwest::Client;
use std::time::Duration;

/// Used when no timeout is configured
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client whose requests give up after `timeout`
pub(crate) fn client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        warn!("Could not build HTTP client with a {:?} timeout: {}", timeout, e);
        Client::new()
    })
}
