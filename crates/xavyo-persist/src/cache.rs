//! Handler cache.
//!
//! Compiling a handler validates the whole descriptor, so applications
//! compile each type once and share the result. Compilation happens under
//! the write lock, so concurrent first uses build a type only once. The
//! cache is an ordinary value owned by the application rather than
//! process-global state.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::descriptor::Persistent;
use crate::error::PersistResult;
use crate::handler::CompiledHandler;

type CachedHandler = Arc<dyn Any + Send + Sync>;

/// Compiled handlers keyed by type.
#[derive(Default)]
pub struct HandlerCache {
    handlers: RwLock<HashMap<TypeId, CachedHandler>>,
}

impl HandlerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the handler for `T`, compiling it on first use.
    ///
    /// A failed compile is not cached; every call retries and reports the
    /// same validation error.
    pub fn get_or_compile<T: Persistent>(&self) -> PersistResult<Arc<CompiledHandler<T>>> {
        if let Some(handler) = self.get::<T>() {
            trace!(type_name = std::any::type_name::<T>(), "Handler cache hit");
            return Ok(handler);
        }

        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have compiled the same type meanwhile.
        if let Some(handler) = handlers
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|handler| handler.downcast::<CompiledHandler<T>>().ok())
        {
            return Ok(handler);
        }

        // Compiling is pure, so holding the lock keeps it to one build per type.
        let compiled = Arc::new(CompiledHandler::compile(T::type_descriptor())?);
        handlers.insert(TypeId::of::<T>(), compiled.clone());
        drop(handlers);

        debug!(type_name = std::any::type_name::<T>(), "Cached compiled handler");
        Ok(compiled)
    }

    /// Get the handler for `T` if it has been compiled.
    pub fn get<T: Persistent>(&self) -> Option<Arc<CompiledHandler<T>>> {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|handler| handler.downcast::<CompiledHandler<T>>().ok())
    }

    /// Number of cached handlers.
    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached handler.
    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl std::fmt::Debug for HandlerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCache")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, MemberPolicy, ObjectDescriptor, TypeDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[derive(Default)]
    struct Device {
        cn: Option<String>,
    }

    impl Persistent for Device {
        fn type_descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Device", ObjectDescriptor::new("device"))
                .default_constructor()
                .field(
                    FieldDescriptor::new("cn", |d: &Device| d.cn.clone(), |d: &mut Device, v| {
                        d.cn = v
                    })
                    .with_policy(MemberPolicy::new().in_rdn()),
                )
        }
    }

    #[derive(Default)]
    struct Broken;

    impl Persistent for Broken {
        fn type_descriptor() -> TypeDescriptor<Self> {
            TypeDescriptor::new("Broken", ObjectDescriptor::new("broken")).default_constructor()
        }
    }

    static PANEL_BUILDS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Panel {
        cn: Option<String>,
    }

    impl Persistent for Panel {
        fn type_descriptor() -> TypeDescriptor<Self> {
            PANEL_BUILDS.fetch_add(1, Ordering::SeqCst);
            TypeDescriptor::new("Panel", ObjectDescriptor::new("device"))
                .default_constructor()
                .field(
                    FieldDescriptor::new("cn", |p: &Panel| p.cn.clone(), |p: &mut Panel, v| {
                        p.cn = v
                    })
                    .with_policy(MemberPolicy::new().in_rdn()),
                )
        }
    }

    #[test]
    fn test_concurrent_misses_compile_once() {
        let cache = Arc::new(HandlerCache::new());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_compile::<Panel>().unwrap()
                })
            })
            .collect();
        let handlers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(PANEL_BUILDS.load(Ordering::SeqCst), 1);
        assert!(handlers.iter().all(|h| Arc::ptr_eq(h, &handlers[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_handler_compiled_once() {
        let cache = HandlerCache::new();
        assert!(cache.is_empty());
        assert!(cache.get::<Device>().is_none());

        let first = cache.get_or_compile::<Device>().unwrap();
        let second = cache.get_or_compile::<Device>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(first.structural_class(), "device");
    }

    #[test]
    fn test_failed_compile_is_not_cached() {
        let cache = HandlerCache::new();
        for _ in 0..2 {
            let err = cache.get_or_compile::<Broken>().unwrap_err();
            assert!(err.to_string().contains("no RDN defined"));
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_shared_across_threads() {
        let cache = Arc::new(HandlerCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .get_or_compile::<Device>()
                        .unwrap()
                        .construct_dn(
                            &Device {
                                cn: Some("printer".to_string()),
                            },
                            Some("dc=example,dc=com"),
                        )
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "cn=printer,dc=example,dc=com");
        }
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
