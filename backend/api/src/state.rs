use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use flx_auth::TokenIssuer;
use flx_store::Store;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Sends a verification code to a user's email. The real implementation is
/// an SMTP/SES adapter; this crate ships only the seam and a logging stub,
/// per the mailer collaborator out of scope for this platform's core logic.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, email: &str, code: &str);
}

pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send_verification_code(&self, email: &str, code: &str) {
        info!(email, code, "verification code issued (logging mailer, no email sent)");
    }
}

/// Creates checkout sessions and verifies webhook signatures. The real
/// implementation talks to Stripe or a similar provider; this crate ships
/// only the seam and a logging stub.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, user_id: &str, tier: &str) -> anyhow::Result<String>;
}

pub struct LoggingPaymentGateway;

#[async_trait]
impl PaymentGateway for LoggingPaymentGateway {
    async fn create_checkout_session(&self, user_id: &str, tier: &str) -> anyhow::Result<String> {
        warn!(user_id, tier, "stub payment gateway: returning an opaque placeholder checkout URL");
        Ok(format!("https://billing.flexionintel.com/checkout/{user_id}/{tier}"))
    }
}

/// Maps a stable `preview_key` to a lead id. Built at startup and rebuilt on
/// a timer; readers never block behind the rebuild.
#[derive(Default)]
pub struct PreviewCache {
    inner: RwLock<HashMap<String, String>>,
}

impl PreviewCache {
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.inner.read().expect("preview cache lock poisoned").get(key).cloned()
    }

    pub fn replace(&self, entries: HashMap<String, String>) {
        *self.inner.write().expect("preview cache lock poisoned") = entries;
    }
}

pub const PREVIEW_CACHE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub tokens: Arc<TokenIssuer>,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
    pub preview_cache: Arc<PreviewCache>,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: Arc<AppConfig>) -> Self {
        let tokens = Arc::new(TokenIssuer::new(config.auth.jwt_secret.clone().into_bytes()));
        Self {
            store,
            tokens,
            config,
            mailer: Arc::new(LoggingMailer),
            payments: Arc::new(LoggingPaymentGateway),
            preview_cache: Arc::new(PreviewCache::default()),
        }
    }
}
