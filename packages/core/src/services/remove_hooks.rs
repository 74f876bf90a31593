//! Pre-removal Hook Registry
//!
//! Decouples the category engine from dependents that must veto or react to
//! category deletion (the article store registers one to enforce its
//! foreign-key-like constraint). An explicit registry object rather than a
//! broadcast channel: hooks run in registration order, each awaited to
//! completion, and the first failure aborts the removal before any storage
//! mutation happens - none of which a fire-and-forget channel can express.

use crate::services::error::CategoryServiceError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Future returned by a pre-removal hook.
pub type HookFuture = Pin<Box<dyn Future<Output = Result<(), CategoryServiceError>> + Send>>;

/// A pre-removal hook: receives the id of the category about to be removed
/// and may veto the removal by returning an error.
pub type RemoveHook = Arc<dyn Fn(i64) -> HookFuture + Send + Sync>;

/// Handle returned by [`RemoveHookRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Ordered registry of pre-removal hooks.
pub struct RemoveHookRegistry {
    hooks: RwLock<Vec<(HookId, RemoveHook)>>,
    next_id: AtomicU64,
}

impl Default for RemoveHookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoveHookRegistry {
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a hook; hooks run in registration order.
    pub fn register<F>(&self, hook: F) -> HookId
    where
        F: Fn(i64) -> HookFuture + Send + Sync + 'static,
    {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks
            .write()
            .expect("hook registry lock poisoned")
            .push((id, Arc::new(hook)));
        id
    }

    /// Remove a previously registered hook. Returns false for unknown ids.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write().expect("hook registry lock poisoned");
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() < before
    }

    pub fn len(&self) -> usize {
        self.hooks.read().expect("hook registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every hook sequentially, in registration order.
    ///
    /// The first error aborts the sequence and propagates to the caller;
    /// later hooks are not invoked.
    pub async fn notify(&self, category_id: i64) -> Result<(), CategoryServiceError> {
        // Clone the hook list out so no lock is held across an await
        let hooks: Vec<RemoveHook> = self
            .hooks
            .read()
            .expect("hook registry lock poisoned")
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect();

        for hook in hooks {
            hook(category_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_hook(log: Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl Fn(i64) -> HookFuture {
        move |_id| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().unwrap().push(name);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let registry = RemoveHookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register(recording_hook(log.clone(), "first"));
        registry.register(recording_hook(log.clone(), "second"));
        registry.register(recording_hook(log.clone(), "third"));

        registry.notify(5).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_failing_hook_stops_the_sequence() {
        let registry = RemoveHookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        registry.register(recording_hook(log.clone(), "first"));
        registry.register(|id| {
            Box::pin(async move {
                Err(CategoryServiceError::integrity(format!(
                    "category {} is still referenced",
                    id
                )))
            })
        });
        registry.register(recording_hook(log.clone(), "never"));

        let err = registry.notify(9).await.unwrap_err();
        assert!(matches!(err, CategoryServiceError::Integrity(_)));
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = RemoveHookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let id = registry.register(recording_hook(log.clone(), "removable"));
        registry.register(recording_hook(log.clone(), "kept"));
        assert_eq!(registry.len(), 2);

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert_eq!(registry.len(), 1);

        registry.notify(1).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }
}
