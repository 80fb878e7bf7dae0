//! Connection manager owning the active backend.
//!
//! The active `ConnectionContext` lives behind an `Arc` and is replaced
//! wholesale on every (re)initialization. Readers clone the `Arc` and drop the
//! lock straight away, so an operation that started against one context
//! finishes against it even if the mode is switched meanwhile.

use async_lock::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::drivers::ConnectionFactory;
use super::error::{StoreError, StoreResult};
use super::schema::SchemaDefinition;
use super::traits::{BoxedConnection, ConnectionConfig, DatabaseConnection, Mode, TableOperations};

/// Connection descriptors for both modes.
#[derive(Debug, Clone)]
pub struct BackendDescriptors {
    pub remote: ConnectionConfig,
    pub local: ConnectionConfig,
}

impl BackendDescriptors {
    pub fn for_mode(&self, mode: Mode) -> &ConnectionConfig {
        match mode {
            Mode::Remote => &self.remote,
            Mode::Local => &self.local,
        }
    }
}

/// Mode plus the handle built for it.
///
/// A handle that could not be built is kept as its error message; it is
/// reported by `probe` and by every operation attempted against it.
pub struct ConnectionContext {
    mode: Mode,
    config: ConnectionConfig,
    handle: Result<BoxedConnection, String>,
}

impl std::fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("mode", &self.mode)
            .field("target", &self.config.display_name())
            .field("ready", &self.handle.is_ok())
            .finish()
    }
}

impl ConnectionContext {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The bound backend, or the construction error as a connectivity failure.
    pub fn connection(&self) -> StoreResult<&dyn TableOperations> {
        match &self.handle {
            Ok(conn) => Ok(conn.as_ref()),
            Err(message) => Err(StoreError::Connectivity(message.clone())),
        }
    }
}

/// Outcome of a liveness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub ok: bool,
    pub detail: String,
    pub mode: Mode,
}

/// Owner of the process-wide connection context.
///
/// Cloning shares the same context.
#[derive(Clone)]
pub struct ConnectionManager {
    descriptors: Arc<BackendDescriptors>,
    schema: SchemaDefinition,
    context: Arc<RwLock<Arc<ConnectionContext>>>,
    fallback_spent: Arc<AtomicBool>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("table", &self.schema.table_name())
            .finish()
    }
}

impl ConnectionManager {
    /// Create a manager with a context for `mode`. Nothing is probed yet.
    pub fn new(descriptors: BackendDescriptors, schema: SchemaDefinition, mode: Mode) -> Self {
        let context = Self::build_context(&descriptors, &schema, mode);

        Self {
            descriptors: Arc::new(descriptors),
            schema,
            context: Arc::new(RwLock::new(Arc::new(context))),
            fallback_spent: Arc::new(AtomicBool::new(false)),
        }
    }

    fn build_context(
        descriptors: &BackendDescriptors,
        schema: &SchemaDefinition,
        mode: Mode,
    ) -> ConnectionContext {
        let config = descriptors.for_mode(mode).clone();
        let handle = ConnectionFactory::create(config.clone(), schema.clone()).map_err(|e| {
            tracing::warn!("Could not build {} backend: {}", mode, e);
            e.to_string()
        });

        ConnectionContext {
            mode,
            config,
            handle,
        }
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Snapshot of the active context, valid for one operation.
    pub async fn current(&self) -> Arc<ConnectionContext> {
        self.context.read().await.clone()
    }

    pub async fn mode(&self) -> Mode {
        self.current().await.mode
    }

    /// Build a handle for `mode` and commit it as the active context.
    pub async fn initialize(&self, mode: Mode) {
        let mut guard = self.context.write().await;
        let previous = std::mem::replace(
            &mut *guard,
            Arc::new(Self::build_context(&self.descriptors, &self.schema, mode)),
        );
        tracing::info!(
            "Initialized {} backend: {}",
            mode,
            guard.config.display_name()
        );
        drop(guard);

        Self::retire(previous).await;
    }

    /// Toggle remote/local and replace the context. Returns the new mode.
    pub async fn switch_mode(&self) -> Mode {
        let mut guard = self.context.write().await;
        let next = guard.mode.toggled();
        let previous = std::mem::replace(
            &mut *guard,
            Arc::new(Self::build_context(&self.descriptors, &self.schema, next)),
        );
        drop(guard);

        tracing::info!("Switched from {} to {} mode", previous.mode, next);
        Self::retire(previous).await;
        next
    }

    /// Close a replaced context's pool if no snapshot still holds it.
    /// Otherwise the pool is released when the last snapshot drops.
    async fn retire(previous: Arc<ConnectionContext>) {
        if let Some(context) = Arc::into_inner(previous) {
            if let Ok(conn) = &context.handle {
                conn.close().await;
                tracing::debug!("Closed {} backend pool", context.mode);
            }
        }
    }

    /// Run `SELECT 1` against the active backend. Never fails.
    pub async fn probe(&self) -> ProbeResult {
        let context = self.current().await;

        let outcome = match context.connection() {
            Ok(conn) => conn.probe().await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => ProbeResult {
                ok: true,
                detail: format!(
                    "connected to {} ({})",
                    context.config.display_name(),
                    context.config.database_type
                ),
                mode: context.mode,
            },
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Probe of {} backend failed: {}", context.mode, e);
                ProbeResult {
                    ok: false,
                    detail: e.to_string(),
                    mode: context.mode,
                }
            }
        }
    }

    /// Probe the active backend and, if remote is unreachable, fall back to
    /// local. The fallback happens at most once per manager.
    pub async fn establish(&self) -> ProbeResult {
        let probe = self.probe().await;
        if probe.ok || probe.mode != Mode::Remote {
            return probe;
        }

        if self.fallback_spent.swap(true, Ordering::SeqCst) {
            tracing::warn!("Remote backend unreachable; local fallback already used");
            return probe;
        }

        tracing::warn!(
            "Could not reach the remote database ({}). Switching to local mode.",
            probe.detail
        );
        self.initialize(Mode::Local).await;
        self.probe().await
    }
}
