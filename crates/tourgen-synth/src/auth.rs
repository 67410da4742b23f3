//! Access tokens for Vertex AI and Cloud Storage.
//!
//! Provides a thread-safe, async-aware token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight refresh behind a write lock
//! - Fallback to the existing token when a refresh fails but it is still usable

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{SynthError, SynthResult};

// =============================================================================
// Constants
// =============================================================================

/// Refresh the token this long before it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the provider reports an unusable expiry.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope covering Vertex AI and Cloud Storage.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

// =============================================================================
// Token Source
// =============================================================================

/// Supplies bearer tokens for outgoing requests.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> SynthResult<String>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// A fixed token, for tests and pre-minted credentials.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> SynthResult<String> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// Token Cache
// =============================================================================

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// gcp_auth-backed token source with caching.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            cache: RwLock::new(None),
        }
    }

    /// Build from the ambient credentials.
    ///
    /// An explicit service-account file (`GOOGLE_APPLICATION_CREDENTIALS`)
    /// takes precedence; otherwise gcp_auth's provider discovery is used.
    pub async fn from_env() -> SynthResult<Self> {
        let explicit = CustomServiceAccount::from_env()
            .map_err(|e| SynthError::auth(format!("Failed to load service account: {}", e)))?;

        let auth: Arc<dyn TokenProvider> = match explicit {
            Some(sa) => Arc::new(sa),
            None => gcp_auth::provider()
                .await
                .map_err(|e| SynthError::auth(format!("No GCP credentials available: {}", e)))?,
        };
        Ok(Self::new(auth))
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> SynthResult<String> {
        match self.auth.token(&[CLOUD_PLATFORM_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();

                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();
                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                        }
                    } else {
                        Instant::now()
                    }
                };

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Vertex AI auth token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }
                Err(SynthError::auth(format!("Failed to obtain auth token: {}", e)))
            }
        }
    }
}

#[async_trait]
impl AccessTokenSource for TokenCache {
    async fn access_token(&self) -> SynthResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn invalidate(&self) {
        *self.cache.write().await = None;
    }
}
