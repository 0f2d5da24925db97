use log::{debug, warn};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::graph::retry::{RetryPolicy, Sleeper, ThreadSleeper};

pub type Query = Vec<(String, String)>;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A single authenticated GET, no retries.
pub trait Transport {
    fn get(&self, url: &str, token: &str, query: &[(String, String)]) -> Result<RawResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, token: &str, query: &[(String, String)]) -> Result<RawResponse> {
        let mut req = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        // continuation links already carry their own query string
        if !query.is_empty() {
            req = req.query(query);
        }

        let transport_err = |e: reqwest::Error| Error::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let resp = req.send().map_err(transport_err)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(transport_err)?;
        Ok(RawResponse { status, body })
    }
}

/// Authenticated GETs with exponential backoff on 429 and 5xx.
pub struct HttpRetryClient<T = ReqwestTransport, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl HttpRetryClient {
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new()?, ThreadSleeper))
    }
}

impl<T: Transport, S: Sleeper> HttpRetryClient<T, S> {
    pub fn new(transport: T, sleeper: S) -> Self {
        Self {
            transport,
            sleeper,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET returning the parsed JSON body.
    pub fn get(&self, url: &str, token: &str, query: &[(String, String)]) -> Result<serde_json::Value> {
        self.get_json(url, token, query)
    }

    pub fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(String, String)],
    ) -> Result<D> {
        let resp = self.get_with_retry(url, token, query)?;
        serde_json::from_str(&resp.body).map_err(|e| Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn get_with_retry(&self, url: &str, token: &str, query: &[(String, String)]) -> Result<RawResponse> {
        let mut attempt = 0;
        loop {
            debug!("GET {url}");
            let resp = self.transport.get(url, token, query)?;

            if (200..300).contains(&resp.status) {
                return Ok(resp);
            }
            if resp.status == 401 {
                return Err(Error::auth(format!("token rejected by {url}: {}", resp.body)));
            }
            if RetryPolicy::is_retryable(resp.status) {
                attempt += 1;
                if let Some(delay) = self.policy.next_delay(resp.status, attempt) {
                    warn!(
                        "{} from {url}; retry {attempt}/{} in {}s",
                        resp.status,
                        self.policy.max_retries,
                        delay.as_secs()
                    );
                    self.sleeper.sleep(delay);
                    continue;
                }
            }
            return Err(Error::Http {
                status: resp.status,
                body: resp.body,
            });
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use super::*;

    /// Serves queued responses per URL and records every call.
    #[derive(Default)]
    pub struct FakeTransport {
        routes: RefCell<HashMap<String, VecDeque<RawResponse>>>,
        pub calls: RefCell<Vec<(String, Query)>>,
    }

    impl FakeTransport {
        pub fn route(self, url: &str, status: u16, body: &str) -> Self {
            self.routes
                .borrow_mut()
                .entry(url.to_string())
                .or_default()
                .push_back(RawResponse::new(status, body));
            self
        }

        pub fn call_urls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(u, _)| u.clone()).collect()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str, _token: &str, query: &[(String, String)]) -> Result<RawResponse> {
            self.calls.borrow_mut().push((url.to_string(), query.to_vec()));
            let mut routes = self.routes.borrow_mut();
            let queue = routes.get_mut(url);
            Ok(match queue {
                // the last queued response repeats
                Some(q) if q.len() > 1 => q.pop_front().unwrap(),
                Some(q) if !q.is_empty() => q[0].clone(),
                _ => RawResponse::new(404, r#"{"error":{"code":"ErrorItemNotFound"}}"#),
            })
        }
    }

    #[derive(Default)]
    pub struct RecordingSleeper {
        pub slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    pub fn client(transport: FakeTransport) -> HttpRetryClient<FakeTransport, RecordingSleeper> {
        HttpRetryClient::new(transport, RecordingSleeper::default())
    }

    impl<T> HttpRetryClient<T, RecordingSleeper> {
        pub fn slept_secs(&self) -> Vec<u64> {
            self.sleeper.slept.borrow().iter().map(Duration::as_secs).collect()
        }
    }
}
