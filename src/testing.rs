//! Test doubles and helpers for tests that go through HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use crate::api::build_app;
use crate::app_state::{AppState, WebhookSettings};
use crate::dispatch::spawn_dispatch_core;
use crate::error::AppError;
use crate::hub::HubConfig;
use crate::identity::{IdentityProvider, PlatformIdentity};
use crate::payments::{PaymentIntent, PaymentProvider};
use crate::persistence::MemoryStore;

/// Webhook signing secret used by [`spawn_app`].
pub(crate) const WEBHOOK_SECRET: &str = "whsec_test";

/// Authorization code [`FakeIdentity`] accepts.
pub(crate) const GOOD_CODE: &str = "good-code";

/// Serves `router` on an ephemeral local port and returns its base URL.
///
/// Returns `None` if the listener could not be bound.
pub(crate) async fn serve_stub(router: Router) -> Option<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Some(format!("http://{addr}"))
}

/// Payment provider handing out sequential intents.
#[derive(Debug, Default)]
pub(crate) struct FakePayments {
    created: AtomicUsize,
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_payment_intent(
        &self,
        _amount: i64,
        _currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        Ok(PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: format!("pi_{n}_secret"),
        })
    }
}

/// Identity provider that only accepts [`GOOD_CODE`].
#[derive(Debug)]
pub(crate) struct FakeIdentity {
    identity: PlatformIdentity,
}

impl FakeIdentity {
    pub(crate) fn new(user_id: &str, login: &str) -> Self {
        Self {
            identity: PlatformIdentity {
                user_id: user_id.to_string(),
                login: login.to_string(),
            },
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve(&self, code: &str) -> Result<Option<PlatformIdentity>, AppError> {
        Ok((code == GOOD_CODE).then(|| self.identity.clone()))
    }
}

/// A running application backed by in-memory collaborators.
#[derive(Debug)]
pub(crate) struct TestApp {
    pub(crate) base: String,
    pub(crate) state: AppState,
    pub(crate) store: Arc<MemoryStore>,
}

/// Starts the full application on an ephemeral port.
pub(crate) async fn spawn_app() -> Option<TestApp> {
    let store = Arc::new(MemoryStore::new());
    let (hub, event_bus) = spawn_dispatch_core(HubConfig::default(), 16).ok()?;
    let state = AppState {
        donations: Arc::clone(&store) as _,
        streamers: Arc::clone(&store) as _,
        payments: Arc::new(FakePayments::default()),
        identity: Arc::new(FakeIdentity::new("1234", "ada")),
        hub,
        event_bus,
        webhook: WebhookSettings {
            secret: WEBHOOK_SECRET.to_string(),
            tolerance: Duration::from_secs(300),
        },
        currency: "usd".to_string(),
        ws_outbound_capacity: 8,
    };
    let base = serve_stub(build_app(state.clone())).await?;
    Some(TestApp { base, state, store })
}
