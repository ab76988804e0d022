//! Test doubles for the token source and GraphQL transport.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::client::{GraphqlRequest, GraphqlTransport, WclClient};
use super::token::{TokenProvider, TokenSource};
use crate::error::{Result, WclError};

/// Hands out "token-1", "token-2", ... and counts how often it was asked.
pub struct CountingTokens {
  fetches: AtomicUsize,
  /// Number of successful fetches before every further fetch fails
  succeed_for: usize,
}

impl CountingTokens {
  pub fn new() -> Self {
    Self::failing_after(usize::MAX)
  }

  pub fn failing() -> Self {
    Self::failing_after(0)
  }

  pub fn failing_after(succeed_for: usize) -> Self {
    Self {
      fetches: AtomicUsize::new(0),
      succeed_for,
    }
  }

  pub fn fetches(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl TokenSource for CountingTokens {
  async fn fetch_token(&self) -> Result<String> {
    let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
    if n > self.succeed_for {
      return Err(WclError::Auth("invalid_client".to_string()));
    }
    Ok(format!("token-{}", n))
  }
}

type Handler = Box<dyn Fn(GraphqlRequest) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Transport that answers from a handler and records every call.
pub struct FakeTransport {
  handler: Handler,
  calls: Mutex<Vec<(String, GraphqlRequest)>>,
}

impl FakeTransport {
  pub fn new<F, Fut>(handler: F) -> Self
  where
    F: Fn(GraphqlRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
  {
    Self {
      handler: Box::new(move |request| handler(request).boxed()),
      calls: Mutex::new(Vec::new()),
    }
  }

  /// Answer calls with `responses` in order, then fail.
  pub fn scripted(responses: Vec<Result<Value>>) -> Self {
    let queue = Mutex::new(VecDeque::from(responses));
    Self::new(move |_| {
      let next = queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(WclError::Upstream("no scripted response left".to_string())));
      async move { next }
    })
  }

  /// (token, request) for every call, in call order
  pub fn calls(&self) -> Vec<(String, GraphqlRequest)> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl GraphqlTransport for FakeTransport {
  async fn execute(&self, token: &str, request: &GraphqlRequest) -> Result<Value> {
    self
      .calls
      .lock()
      .unwrap()
      .push((token.to_string(), request.clone()));
    (self.handler)(request.clone()).await
  }
}

pub fn client_with(tokens: Arc<CountingTokens>, transport: Arc<FakeTransport>) -> WclClient {
  WclClient::new(Arc::new(TokenProvider::new(tokens)), transport)
}
