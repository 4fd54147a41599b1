//! Scripted gateway fake shared by the auth and aggregation tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::auth::AuthToken;
use crate::error::{HubError, Result};
use crate::gateway::{FetchOutcome, Gateway};

/// A gateway whose responses are queued up front. An empty login queue
/// fails like a down gateway; an empty fetch queue fails like a 500.
#[derive(Default)]
pub struct MockGateway {
    logins: Mutex<VecDeque<AuthToken>>,
    fetches: Mutex<VecDeque<FetchOutcome>>,
    login_count: AtomicUsize,
    fetch_count: AtomicUsize,
    tokens_seen: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_login(&self, token: AuthToken) {
        self.logins.lock().unwrap().push_back(token);
    }

    pub fn push_fetch(&self, outcome: FetchOutcome) {
        self.fetches.lock().unwrap().push_back(outcome);
    }

    pub fn login_count(&self) -> usize {
        self.login_count.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Bearer values presented to `fetch_sessions`, in call order.
    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn login(&self) -> Result<AuthToken> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        self.logins
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| HubError::Auth("scripted login failure".to_string()))
    }

    async fn fetch_sessions(
        &self,
        token: &str,
        _start_utc: DateTime<Utc>,
        _end_utc: DateTime<Utc>,
    ) -> Result<FetchOutcome> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.to_string());
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(HubError::Gateway {
                endpoint: crate::gateway::FETCH_ENDPOINT.to_string(),
                status: 500,
                message: "scripted fetch failure".to_string(),
            })
    }
}
