//! Environment bindings and the per-invocation execution context.
//!
//! Both are supplied by the host and passed through the pipeline untouched.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Bindings available to handlers: plain variables and named resources.
#[derive(Clone, Default)]
pub struct Environment {
    /// Environment variables (configuration, secrets).
    pub vars: HashMap<String, String>,
    /// Bound resources such as clients or caches, looked up by name and type.
    bindings: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment from a set of variables.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            bindings: HashMap::new(),
        }
    }

    /// Add an environment variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Bind a named resource.
    pub fn with_binding<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.bindings.insert(name.into(), Arc::new(value));
        self
    }

    /// Get an environment variable.
    pub fn var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Get a bound resource, if one exists under `name` with type `T`.
    pub fn binding<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.bindings
            .get(name)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Handle on the surrounding invocation's lifecycle.
///
/// Cloning is cheap; all clones share the cancellation signal and the set of
/// background tasks registered through [`ExecutionContext::wait_until`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Request ID for tracing.
    pub request_id: String,
    cancel: CancellationToken,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ExecutionContext {
    /// Create a new execution context.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// The host-level cancellation signal for this invocation.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Signal cancellation to every hook and handler observing this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check whether the host has cancelled this invocation.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve once the host cancels this invocation.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Extend the invocation with background work that may outlive the response.
    ///
    /// Must be called from within a tokio runtime.
    pub fn wait_until<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.background.lock().push(handle);
    }

    /// Number of background tasks registered and not yet drained.
    pub fn pending_background(&self) -> usize {
        self.background.lock().len()
    }

    /// Await every background task registered so far.
    pub async fn drain(&self) {
        loop {
            let handles: Vec<_> = std::mem::take(&mut *self.background.lock());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Background task failed [{}]: {}", self.request_id, e);
                }
            }
        }
    }
}
