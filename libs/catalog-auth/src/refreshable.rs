//! Cached bearer token with single-flight refresh.
//!
//! The cached `(token, expiry)` pair is swapped in as one `Arc`, so readers
//! never observe a torn pair. At most one fetch is in flight at a time; callers
//! arriving during a refresh await the same shared future and receive its
//! result. A refresh is only published after the fetch completes, so dropping
//! a caller mid-refresh cannot leave a partial token behind. A source that
//! panics fails that refresh only; the next caller starts a fresh one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use secrecy::SecretString;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::errors::TokenError;
use crate::provider::BearerTokenProvider;

/// Default lifetime assumed when a source does not report one.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);

/// Default margin before expiry at which a token is considered stale.
///
/// Never more than half of a token's lifetime is spent inside the margin.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(30);

/// Upper bound on the lifetime accepted from a source.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A freshly fetched token and its reported lifetime.
#[derive(Debug, Clone)]
pub struct FetchedToken {
    pub value: SecretString,
    pub expires_in: Option<Duration>,
}

/// Origin of refreshable tokens (e.g. an OAuth2 client-credentials exchange).
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a new token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the token could not be obtained.
    async fn fetch(&self) -> Result<FetchedToken, TokenError>;
}

struct CachedToken {
    value: SecretString,
    refresh_at: Instant,
}

impl CachedToken {
    fn new(value: SecretString, fetched_at: Instant, ttl: Duration, skew: Duration) -> Self {
        let ttl = ttl.min(MAX_TOKEN_TTL);
        let skew = skew.min(ttl.checked_div(2).unwrap_or_default());
        let refresh_at = fetched_at
            .checked_add(ttl.saturating_sub(skew))
            .unwrap_or(fetched_at);
        Self { value, refresh_at }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.refresh_at
    }
}

type RefreshFuture = Shared<BoxFuture<'static, Result<SecretString, TokenError>>>;

/// [`BearerTokenProvider`] that caches tokens from a [`TokenSource`] and
/// refreshes them lazily on expiry.
pub struct RefreshableBearerTokenProvider {
    source: Arc<dyn TokenSource>,
    cached: Arc<ArcSwapOption<CachedToken>>,
    inflight: Mutex<Option<RefreshFuture>>,
    refresh_skew: Duration,
    default_ttl: Duration,
}

impl RefreshableBearerTokenProvider {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            cached: Arc::new(ArcSwapOption::empty()),
            inflight: Mutex::new(None),
            refresh_skew: DEFAULT_REFRESH_SKEW,
            default_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Treat tokens as expired this long before their reported expiry, capped
    /// at half of each token's lifetime.
    #[must_use]
    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    /// Lifetime to assume when the source reports none.
    #[must_use]
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Drop the cached token so the next call refreshes.
    pub fn invalidate(&self) {
        self.cached.store(None);
    }

    fn fresh_cached(&self) -> Option<SecretString> {
        let guard = self.cached.load();
        guard
            .as_ref()
            .filter(|cached| cached.is_fresh(Instant::now()))
            .map(|cached| cached.value.clone())
    }

    fn start_refresh(&self) -> RefreshFuture {
        let source = Arc::clone(&self.source);
        let cached = Arc::clone(&self.cached);
        let default_ttl = self.default_ttl;
        let refresh_skew = self.refresh_skew;

        async move {
            debug!("refreshing policy engine bearer token");
            let fetched = AssertUnwindSafe(source.fetch())
                .catch_unwind()
                .await
                .map_err(|_| {
                    warn!("bearer token source panicked");
                    TokenError::Transport("token source panicked".to_owned())
                })??;
            let ttl = fetched.expires_in.unwrap_or(default_ttl);
            let entry = Arc::new(CachedToken::new(
                fetched.value,
                Instant::now(),
                ttl,
                refresh_skew,
            ));
            cached.store(Some(Arc::clone(&entry)));
            debug!(ttl_secs = ttl.as_secs(), "bearer token refreshed");
            Ok::<_, TokenError>(entry.value.clone())
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for RefreshableBearerTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshableBearerTokenProvider")
            .field("refresh_skew", &self.refresh_skew)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BearerTokenProvider for RefreshableBearerTokenProvider {
    async fn token(&self) -> Result<SecretString, TokenError> {
        if let Some(token) = self.fresh_cached() {
            return Ok(token);
        }

        let refresh = {
            let mut slot = self.inflight.lock();
            // Re-check under the lock: a refresh may have completed meanwhile.
            if let Some(token) = self.fresh_cached() {
                return Ok(token);
            }
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let started = self.start_refresh();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        let mut guard = InflightGuard {
            slot: &self.inflight,
            refresh,
            finished: false,
        };
        let result = guard.refresh.clone().await;
        guard.finished = true;
        result
    }
}

/// Releases the in-flight slot once its refresh has settled.
///
/// A cancelled caller leaves the slot alone so the next caller resumes the
/// same fetch; completion or an unwinding panic clears it.
struct InflightGuard<'a> {
    slot: &'a Mutex<Option<RefreshFuture>>,
    refresh: RefreshFuture,
    finished: bool,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            return;
        }
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&self.refresh)) {
            *slot = None;
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use secrecy::ExposeSecret;

    use super::*;

    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
        expires_in: Option<Duration>,
    }

    impl CountingSource {
        fn new(delay: Duration, expires_in: Option<Duration>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                expires_in,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch(&self) -> Result<FetchedToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            Ok(FetchedToken {
                value: SecretString::from(format!("token-{n}")),
                expires_in: self.expires_in,
            })
        }
    }

    struct FailingSource {
        calls: AtomicUsize,
    }

    struct PanicOnceSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenSource for PanicOnceSource {
        async fn fetch(&self) -> Result<FetchedToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            assert!(n > 1, "token source blew up");
            Ok(FetchedToken {
                value: SecretString::from(format!("token-{n}")),
                expires_in: Some(Duration::from_secs(600)),
            })
        }
    }

    #[async_trait]
    impl TokenSource for FailingSource {
        async fn fetch(&self) -> Result<FetchedToken, TokenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(TokenError::Status { status: 401 })
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_single_fetch() {
        let source = CountingSource::new(Duration::from_millis(50), Some(Duration::from_secs(600)));
        let provider = Arc::new(RefreshableBearerTokenProvider::new(source.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.token().await })
            })
            .collect();

        let mut tokens = Vec::new();
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            tokens.push(token.expose_secret().to_owned());
        }

        assert_eq!(source.calls(), 1);
        assert!(tokens.iter().all(|t| t == "token-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn cached_token_is_reused_until_expiry() {
        let source = CountingSource::new(Duration::ZERO, Some(Duration::from_secs(120)));
        let provider = RefreshableBearerTokenProvider::new(source.clone())
            .with_refresh_skew(Duration::from_secs(10));

        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-1");
        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-1");
        assert_eq!(source.calls(), 1);

        // 115s elapsed: inside the 10s skew window.
        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_expiry_uses_default_ttl() {
        let source = CountingSource::new(Duration::ZERO, None);
        let provider = RefreshableBearerTokenProvider::new(source.clone())
            .with_default_ttl(Duration::from_secs(60))
            .with_refresh_skew(Duration::ZERO);

        provider.token().await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        provider.token().await.unwrap();
        assert_eq!(source.calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        provider.token().await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn waiters_receive_the_in_flight_failure() {
        let source = Arc::new(FailingSource {
            calls: AtomicUsize::new(0),
        });
        let provider = Arc::new(RefreshableBearerTokenProvider::new(source.clone()));

        let results = futures::future::join_all((0..8).map(|_| {
            let provider = Arc::clone(&provider);
            async move { provider.token().await }
        }))
        .await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap_err(), TokenError::Status { status: 401 });
        }
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let source = Arc::new(FailingSource {
            calls: AtomicUsize::new(0),
        });
        let provider = RefreshableBearerTokenProvider::new(source.clone());

        assert!(provider.token().await.is_err());
        assert!(provider.token().await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cancelled_caller_does_not_corrupt_cache() {
        let source = CountingSource::new(Duration::from_millis(200), Some(Duration::from_secs(600)));
        let provider = Arc::new(RefreshableBearerTokenProvider::new(source.clone()));

        let cancelled = tokio::time::timeout(Duration::from_millis(10), provider.token()).await;
        assert!(cancelled.is_err());

        // The abandoned refresh is still parked in the slot and completes for the next caller.
        let token = provider.token().await.unwrap();
        assert_eq!(token.expose_secret(), "token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refresh() {
        let source = CountingSource::new(Duration::ZERO, Some(Duration::from_secs(600)));
        let provider = RefreshableBearerTokenProvider::new(source.clone());

        provider.token().await.unwrap();
        provider.invalidate();
        let token = provider.token().await.unwrap();

        assert_eq!(token.expose_secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_expiry_is_capped_instead_of_overflowing() {
        let source = CountingSource::new(Duration::ZERO, Some(Duration::from_secs(u64::MAX)));
        let provider = Arc::new(RefreshableBearerTokenProvider::new(source.clone()));

        let first = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.token().await }
        })
        .await
        .unwrap();
        assert_eq!(first.unwrap().expose_secret(), "token-1");

        let second = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.token().await }
        })
        .await
        .unwrap();
        assert_eq!(second.unwrap().expose_secret(), "token-1");
        assert_eq!(source.calls(), 1);

        tokio::time::advance(MAX_TOKEN_TTL).await;
        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-2");
    }

    #[tokio::test]
    async fn panicking_source_does_not_wedge_later_refreshes() {
        let source = Arc::new(PanicOnceSource {
            calls: AtomicUsize::new(0),
        });
        let provider = RefreshableBearerTokenProvider::new(source.clone());

        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, TokenError::Transport(_)));

        let token = provider.token().await.unwrap();
        assert_eq!(token.expose_secret(), "token-2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn short_lived_token_is_cached_despite_skew() {
        let source = CountingSource::new(Duration::ZERO, Some(Duration::from_secs(30)));
        let provider = RefreshableBearerTokenProvider::new(source.clone());

        for _ in 0..5 {
            assert_eq!(provider.token().await.unwrap().expose_secret(), "token-1");
        }
        assert_eq!(source.calls(), 1);

        // Skew is clamped to half the 30s lifetime.
        tokio::time::advance(Duration::from_secs(14)).await;
        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-1");
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_after_expiry_share_a_single_refresh() {
        let source = CountingSource::new(Duration::from_millis(50), Some(Duration::from_secs(60)));
        let provider = Arc::new(
            RefreshableBearerTokenProvider::new(source.clone()).with_refresh_skew(Duration::ZERO),
        );

        assert_eq!(provider.token().await.unwrap().expose_secret(), "token-1");
        tokio::time::advance(Duration::from_secs(61)).await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { provider.token().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.expose_secret(), "token-2");
        }
        assert_eq!(source.calls(), 2);
    }
}
