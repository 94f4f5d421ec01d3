//! Thin clients for the third-party services behind the side widgets.
//!
//! Every public function here returns a usable value (or, for location, a
//! viewer-facing error). Network and parse failures are logged and replaced
//! by static fallbacks before they reach the dashboard.

pub mod feeds;
pub mod location;
pub mod news;
pub mod translation;
pub mod weather;

use std::time::Duration;

use crate::error::FetchError;

/// HTTP agent with a bounded overall timeout
pub(crate) fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .timeout_connect(Some(timeout.min(Duration::from_secs(5))))
        .build()
        .new_agent()
}

/// GET `url` with the given query pairs and return the body as text
pub(crate) fn get_text(
    agent: &ureq::Agent,
    url: &str,
    query: &[(&str, String)],
    user_agent: &str,
) -> Result<String, FetchError> {
    let mut request = agent.get(url).header("User-Agent", user_agent);
    for (key, value) in query {
        request = request.query(*key, value);
    }
    let mut response = request.call()?;
    Ok(response.body_mut().read_to_string()?)
}
