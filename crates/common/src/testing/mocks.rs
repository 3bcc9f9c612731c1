//! Mock implementations of common traits
//!
//! Provides mock objects for testing purposes.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{RefreshClientError, RefreshClientTrait, RefreshResponse, TokenResponse};
use crate::storage::{LocalStore, StorageError, StorageResult};

type CallLog = Arc<Mutex<Vec<(String, Option<String>)>>>;

/// Scripted refresh endpoint
///
/// Responses are consumed in order; the last one repeats once the script is
/// exhausted.
///
/// # Examples
///
/// ```
/// use modelhub_common::auth::TokenResponse;
/// use modelhub_common::testing::MockRefreshClient;
///
/// let client = MockRefreshClient::issuing(TokenResponse::new("a2", "r2"));
/// assert_eq!(client.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockRefreshClient {
    script: Arc<Mutex<VecDeque<RefreshResponse>>>,
    calls: CallLog,
    delay: Option<Duration>,
}

impl MockRefreshClient {
    /// Answer every refresh with `response`.
    pub fn responding(response: RefreshResponse) -> Self {
        Self::sequence(vec![response])
    }

    /// Answer every refresh with a 201 carrying `tokens`.
    pub fn issuing(tokens: TokenResponse) -> Self {
        Self::responding(RefreshResponse::Issued(tokens))
    }

    /// Answer refreshes with `responses` in order.
    pub fn sequence(responses: Vec<RefreshResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Sleep for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `(refresh_token, bearer)` pairs received so far
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_response(&self) -> Option<RefreshResponse> {
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl RefreshClientTrait for MockRefreshClient {
    async fn refresh_access_token(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<RefreshResponse, RefreshClientError> {
        self.calls.lock().push((refresh_token.to_string(), access_token.map(str::to_string)));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.next_response()
            .ok_or_else(|| RefreshClientError::ParseError("mock script is empty".to_string()))
    }
}

/// Store whose every operation fails
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

impl LocalStore for FailingStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable(format!("read of '{key}' refused")))
    }

    fn set_item(&self, key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(format!("write of '{key}' refused")))
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable(format!("removal of '{key}' refused")))
    }
}
