//! Shared application state wiring connections, configuration, and storage.

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, watch};

use crate::{
    config::AppConfig,
    dao::{catalog_store::CatalogStore, session_store::SessionStore},
    error::ServiceError,
};

/// Shared handle to [`AppState`], cheap to clone across tasks.
pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected client socket.
pub struct ClientConnection {
    /// Connection identifier, doubling as the player id.
    pub id: String,
    /// Writer-task channel for outbound frames.
    pub tx: mpsc::UnboundedSender<Message>,
}

#[derive(Clone)]
/// The pair of store handles installed once the backend is reachable.
pub struct Backends {
    /// Volatile room/gameplay state.
    pub session: Arc<dyn SessionStore>,
    /// Durable anime/character/attribute catalog.
    pub catalog: Arc<dyn CatalogStore>,
}

impl Backends {
    /// Wrap two independent store handles.
    pub fn new(session: Arc<dyn SessionStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { session, catalog }
    }

    /// Wrap a single backend that implements both storage traits.
    pub fn single<B>(backend: B) -> Self
    where
        B: SessionStore + CatalogStore + Clone + 'static,
    {
        Self {
            session: Arc::new(backend.clone()),
            catalog: Arc::new(backend),
        }
    }
}

/// Central application state storing live connections and database handles.
pub struct AppState {
    backends: RwLock<Option<Backends>>,
    degraded: watch::Sender<bool>,
    connections: DashMap<String, ClientConnection>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            backends: RwLock::new(None),
            degraded: degraded_tx,
            connections: DashMap::new(),
            config,
        })
    }

    /// Gameplay tuning values loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain the session store, if a backend is installed.
    pub async fn session_store(&self) -> Option<Arc<dyn SessionStore>> {
        let guard = self.backends.read().await;
        guard.as_ref().map(|backends| backends.session.clone())
    }

    /// Obtain the catalog store, if a backend is installed.
    pub async fn catalog_store(&self) -> Option<Arc<dyn CatalogStore>> {
        let guard = self.backends.read().await;
        guard.as_ref().map(|backends| backends.catalog.clone())
    }

    /// Session store or [`ServiceError::Degraded`] when no backend is available.
    pub async fn require_session_store(&self) -> Result<Arc<dyn SessionStore>, ServiceError> {
        self.session_store().await.ok_or(ServiceError::Degraded)
    }

    /// Catalog store or [`ServiceError::Degraded`] when no backend is available.
    pub async fn require_catalog_store(&self) -> Result<Arc<dyn CatalogStore>, ServiceError> {
        self.catalog_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install freshly connected store handles and leave degraded mode.
    pub async fn install_backends(&self, backends: Backends) {
        {
            let mut guard = self.backends.write().await;
            *guard = Some(backends);
        }
        self.update_degraded(false).await;
    }

    /// Drop the store handles and enter degraded mode.
    pub async fn clear_backends(&self) {
        {
            let mut guard = self.backends.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Registry of active client sockets keyed by their player id.
    pub fn connections(&self) -> &DashMap<String, ClientConnection> {
        &self.connections
    }
}
