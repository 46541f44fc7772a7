//! HTTP seam
//!
//! Every network call in the crate goes through [`HttpClient`], so the
//! fetcher and inspector can be exercised against canned responses.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use crate::error::{FetchError, PluginSearchError, Result};

/// Timeout for repository summary lookups
pub const SUMMARY_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for registry document and tree downloads
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("plugin-search/", env!("CARGO_PKG_VERSION"));

/// Blocking GET returning the response body as text.
pub trait HttpClient {
    fn get(&self, url: &str, timeout: Duration) -> std::result::Result<String, FetchError>;
}

/// reqwest-backed client used outside of tests
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| PluginSearchError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, timeout: Duration) -> std::result::Result<String, FetchError> {
        tracing::debug!(url, ?timeout, "GET");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().map_err(|e| classify(e, timeout))
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else if error.is_decode() || error.is_body() {
        FetchError::Malformed(error.to_string())
    } else {
        FetchError::Network(error.to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Canned responses keyed by URL; unknown URLs fail with a network error.
    #[derive(Default)]
    pub(crate) struct FakeHttp {
        responses: HashMap<String, std::result::Result<String, FetchError>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeHttp {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn fail(mut self, url: &str, error: FetchError) -> Self {
            self.responses.insert(url.to_string(), Err(error));
            self
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl HttpClient for FakeHttp {
        fn get(&self, url: &str, _timeout: Duration) -> std::result::Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Network(format!("no route to {}", url))))
        }
    }
}
