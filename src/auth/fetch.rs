//! Token fetching capability used by the refresher.
//!
//! Anything that can produce a fresh bearer token implements this: the OAuth2
//! client-credentials source, or a plain async closure in tests.

use anyhow::Result;
use std::future::Future;

pub trait FetchToken: Send + Sync + 'static {
    fn fetch_token(&self) -> impl Future<Output = Result<String>> + Send;
}

impl<F, Fut> FetchToken for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send,
{
    fn fetch_token(&self) -> impl Future<Output = Result<String>> + Send {
        self()
    }
}
