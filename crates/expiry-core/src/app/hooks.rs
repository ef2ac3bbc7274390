//! Hook handlers and their registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ExpiryError, HookError};

/// A handler fired when its hook comes due.
///
/// The sweeper is the main implementation; the registry does not care what
/// a handler does, only that it reports failure through `ExpiryError`.
#[async_trait]
pub trait HookHandler: Send + Sync {
    async fn fire(&self) -> Result<(), ExpiryError>;
}

/// Registry of handlers (hook name -> handler).
///
/// Design:
/// - Built during initialization (mutable).
/// - Used during runtime (immutable, shared behind `Arc`).
#[derive(Default)]
pub struct HookRegistry {
    handlers: HashMap<String, Arc<dyn HookHandler>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a hook. A second handler for the same hook is an error.
    pub fn register(
        &mut self,
        hook: impl Into<String>,
        handler: Arc<dyn HookHandler>,
    ) -> Result<(), HookError> {
        let hook = hook.into();
        if self.handlers.contains_key(&hook) {
            return Err(HookError::DuplicateHandler(hook));
        }
        self.handlers.insert(hook, handler);
        Ok(())
    }

    pub fn get(&self, hook: &str) -> Option<&Arc<dyn HookHandler>> {
        self.handlers.get(hook)
    }

    pub fn contains(&self, hook: &str) -> bool {
        self.handlers.contains_key(hook)
    }

    /// Registered hook names, sorted.
    pub fn hooks(&self) -> Vec<String> {
        let mut hooks: Vec<String> = self.handlers.keys().cloned().collect();
        hooks.sort();
        hooks
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Fire the handler registered for `hook`.
    pub async fn fire(&self, hook: &str) -> Result<(), ExpiryError> {
        let handler = self
            .get(hook)
            .ok_or_else(|| HookError::HandlerNotFound(hook.to_string()))?;
        handler.fire().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        fired: AtomicUsize,
    }

    #[async_trait]
    impl HookHandler for CountingHandler {
        async fn fire(&self) -> Result<(), ExpiryError> {
            self.fired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn fires_registered_handler() {
        let handler = Arc::new(CountingHandler::default());
        let mut registry = HookRegistry::new();
        registry.register("tick", handler.clone()).unwrap();

        registry.fire("tick").await.unwrap();
        registry.fire("tick").await.unwrap();

        assert_eq!(handler.fired.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_handler_is_an_error() {
        let registry = HookRegistry::new();
        let err = registry.fire("missing").await.unwrap_err();

        assert!(matches!(
            err,
            ExpiryError::Hook(HookError::HandlerNotFound(hook)) if hook == "missing"
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = HookRegistry::new();
        registry
            .register("tick", Arc::new(CountingHandler::default()))
            .unwrap();
        let result = registry.register("tick", Arc::new(CountingHandler::default()));

        assert!(matches!(result, Err(HookError::DuplicateHandler(_))));
        assert_eq!(registry.hooks(), vec!["tick".to_string()]);
        assert_eq!(registry.len(), 1);
    }
}
