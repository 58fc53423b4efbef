//! Singleton registry: three-tier cache and creation serialization.
//!
//! The registry is the single source of truth for whether a singleton has
//! been created, is mid-creation, or does not exist yet. Three caches back
//! the circular-reference protocol:
//!
//! - the *finished* cache holds fully initialized instances and serves the
//!   lock-light hot path,
//! - the *early-reference* cache holds raw-constructed, not-yet-populated
//!   instances visible only to sibling resolution steps,
//! - the *factory* cache holds one-shot [`ObjectFactory`] entries able to
//!   produce (and wrap, exactly once) the early reference on first pull.
//!
//! For any name at most one of the early and factory tiers holds an entry,
//! and neither coexists with a finished entry.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tracing::{debug, trace, warn};

use crate::definition::{BeanHandle, DestroyFn};
use crate::error::{BeansError, BeansResult};

/// One-shot capability producing a bean's early reference on first pull.
pub type ObjectFactory = Box<dyn FnOnce() -> BeanHandle + Send>;

struct DisposableBean {
    name: String,
    handle: BeanHandle,
    destroy: DestroyFn,
}

/// Serializes and caches singleton construction.
///
/// Creation happens under a registry-wide re-entrant lock: a factory
/// resolving its own dependencies re-enters the registry for *other* names
/// without deadlocking, while a re-entrant request for the *same* name is
/// the constructor-cycle detection path. Finished-cache reads never touch
/// the creation lock.
#[derive(Default)]
pub struct SingletonRegistry {
    /// Finished cache: name to fully initialized instance.
    singletons: RwLock<HashMap<String, BeanHandle>>,
    /// Early-reference cache: raw-constructed, not yet populated.
    early_singletons: Mutex<HashMap<String, BeanHandle>>,
    /// Factory cache: one-shot early-reference producers.
    singleton_factories: Mutex<HashMap<String, ObjectFactory>>,
    /// Creation guard; re-entrant so nested creation from the owning
    /// thread proceeds while other threads wait.
    creation_lock: ReentrantMutex<()>,
    /// Ordered in-creation ledger; doubles as the cycle path report.
    in_creation: Mutex<Vec<String>>,
    /// Names currently being torn down.
    in_destruction: Mutex<HashSet<String>>,
    /// Disposable singletons in registration order.
    disposables: Mutex<Vec<DisposableBean>>,
}

impl SingletonRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the singleton for `name`, creating it via `factory` on a
    /// cache miss.
    ///
    /// The fast path is a finished-cache read. On a miss the creation lock
    /// is taken, the cache re-checked (a racing caller may have won), the
    /// name is pushed onto the in-creation ledger, and the factory runs.
    /// Every failure rolls back all cache mutations made for the name, and
    /// the error comes back wrapped as [`BeansError::Creation`] carrying
    /// the bean name; no retry happens here.
    pub fn get_singleton<F>(&self, name: &str, factory: F) -> BeansResult<BeanHandle>
    where
        F: FnOnce() -> BeansResult<BeanHandle>,
    {
        if let Some(existing) = self.singletons.read().get(name) {
            return Ok(existing.clone());
        }

        let _creation = self.creation_lock.lock();

        if let Some(existing) = self.singletons.read().get(name) {
            return Ok(existing.clone());
        }
        if self.in_destruction.lock().contains(name) {
            return Err(BeansError::CurrentlyInDestruction(name.to_string()));
        }

        self.before_singleton_creation(name)?;
        debug!(bean = name, "creating singleton");

        let produced = match factory() {
            Ok(produced) => produced,
            Err(err) => {
                self.after_singleton_creation(name);
                self.clear_partial(name);
                debug!(bean = name, error = %err, "singleton creation failed");
                return Err(BeansError::Creation {
                    bean: name.to_string(),
                    source: Box::new(err),
                });
            }
        };

        self.after_singleton_creation(name);

        // An early reference that was already injected elsewhere must be
        // the very instance we are about to publish; anything else leaves
        // dependents holding a stale reference.
        let early = self.early_singletons.lock().remove(name);
        self.singleton_factories.lock().remove(name);
        if let Some(early) = early {
            if !handles_identical(&early, &produced) {
                return Err(BeansError::IllegalSingletonState(name.to_string()));
            }
        }

        self.singletons
            .write()
            .insert(name.to_string(), produced.clone());
        debug!(bean = name, "singleton created");
        Ok(produced)
    }

    /// Cache-only lookup: finished cache first, then, for names currently
    /// in creation, the early-reference tier, consuming the one-shot
    /// factory when `allow_early` is set.
    ///
    /// The in-creation gate is what keeps half-built objects invisible to
    /// unrelated callers: once creation ends (either way) the transient
    /// tiers are already cleared or promoted.
    pub fn get_singleton_cached(&self, name: &str, allow_early: bool) -> Option<BeanHandle> {
        if let Some(existing) = self.singletons.read().get(name) {
            return Some(existing.clone());
        }
        if !self.is_singleton_currently_in_creation(name) {
            return None;
        }
        if let Some(existing) = self.early_singletons.lock().get(name) {
            return Some(existing.clone());
        }
        if !allow_early {
            return None;
        }
        let factory = self.singleton_factories.lock().remove(name);
        match factory {
            Some(factory) => {
                // The factory may run a user hook that resolves other beans
                // and re-enters this registry; no cache lock may be held
                // across the call.
                let produced = factory();
                self.early_singletons
                    .lock()
                    .insert(name.to_string(), produced.clone());
                trace!(bean = name, "promoted singleton factory to early reference");
                Some(produced)
            }
            // A racing puller may have promoted the factory between the
            // early-tier check and the factory removal.
            None => self.early_singletons.lock().get(name).cloned(),
        }
    }

    /// Registers the one-shot early-reference factory for a singleton that
    /// just finished raw construction. No-op when an early reference was
    /// already materialized for the name.
    pub fn add_singleton_factory(&self, name: &str, factory: ObjectFactory) {
        let early = self.early_singletons.lock();
        if early.contains_key(name) {
            return;
        }
        self.singleton_factories
            .lock()
            .insert(name.to_string(), factory);
    }

    /// Materializes the early reference for `name`.
    ///
    /// A pending factory entry is consumed exactly once (the wrap-once
    /// substitution point); an existing early reference is returned
    /// unchanged; otherwise `raw` itself is registered and returned.
    pub fn get_early_singleton_reference(&self, name: &str, raw: &BeanHandle) -> BeanHandle {
        let factory = self.singleton_factories.lock().remove(name);
        if let Some(factory) = factory {
            // User code; same no-lock rule as the cached-lookup promotion.
            let produced = factory();
            self.early_singletons
                .lock()
                .insert(name.to_string(), produced.clone());
            trace!(bean = name, "exposed early singleton reference");
            return produced;
        }
        let mut early = self.early_singletons.lock();
        if let Some(existing) = early.get(name) {
            return existing.clone();
        }
        early.insert(name.to_string(), raw.clone());
        trace!(bean = name, "registered raw early singleton reference");
        raw.clone()
    }

    /// True while `name` is on the in-creation ledger.
    pub fn is_singleton_currently_in_creation(&self, name: &str) -> bool {
        self.in_creation.lock().iter().any(|n| n == name)
    }

    /// True when the finished cache holds an instance for `name`.
    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    /// Number of finished singletons.
    pub fn singleton_count(&self) -> usize {
        self.singletons.read().len()
    }

    /// Records a singleton with a destruction callback; teardown runs
    /// callbacks in reverse registration order.
    pub fn register_disposable(&self, name: &str, handle: BeanHandle, destroy: DestroyFn) {
        self.disposables.lock().push(DisposableBean {
            name: name.to_string(),
            handle,
            destroy,
        });
    }

    /// Drops every cache entry for `name` without running its destruction
    /// callback. Used when a definition is removed or replaced.
    pub fn remove_singleton(&self, name: &str) {
        self.singletons.write().remove(name);
        self.clear_partial(name);
        self.disposables.lock().retain(|d| d.name != name);
    }

    /// Tears down one singleton: runs its destruction callback (if any)
    /// with the name marked under-destruction, then clears its caches.
    pub fn destroy_singleton(&self, name: &str) {
        let disposable = {
            let mut disposables = self.disposables.lock();
            disposables
                .iter()
                .position(|d| d.name == name)
                .map(|pos| disposables.remove(pos))
        };
        if let Some(disposable) = disposable {
            self.invoke_destruction(disposable);
        } else {
            self.remove_singleton(name);
        }
    }

    /// Tears down all disposable singletons in reverse registration order,
    /// then clears every cache tier.
    pub fn destroy_singletons(&self) {
        debug!("destroying singletons");
        loop {
            let disposable = self.disposables.lock().pop();
            match disposable {
                Some(d) => self.invoke_destruction(d),
                None => break,
            }
        }
        self.singletons.write().clear();
        self.early_singletons.lock().clear();
        self.singleton_factories.lock().clear();
        self.in_creation.lock().clear();
    }

    fn invoke_destruction(&self, disposable: DisposableBean) {
        self.in_destruction
            .lock()
            .insert(disposable.name.clone());
        self.singletons.write().remove(&disposable.name);
        self.clear_partial(&disposable.name);
        debug!(bean = %disposable.name, "destroying singleton");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            (disposable.destroy)(&disposable.handle)
        }));
        if outcome.is_err() {
            warn!(bean = %disposable.name, "destruction callback panicked");
        }
        self.in_destruction.lock().remove(&disposable.name);
    }

    fn before_singleton_creation(&self, name: &str) -> BeansResult<()> {
        let mut ledger = self.in_creation.lock();
        if ledger.iter().any(|n| n == name) {
            let mut path = ledger.clone();
            path.push(name.to_string());
            return Err(BeansError::CircularCreation { path });
        }
        ledger.push(name.to_string());
        Ok(())
    }

    fn after_singleton_creation(&self, name: &str) {
        let mut ledger = self.in_creation.lock();
        if let Some(pos) = ledger.iter().rposition(|n| n == name) {
            ledger.remove(pos);
        }
    }

    /// Removes the transient-tier entries for a name (rollback path).
    fn clear_partial(&self, name: &str) {
        self.early_singletons.lock().remove(name);
        self.singleton_factories.lock().remove(name);
    }
}

/// Pointer identity over type-erased handles.
fn handles_identical(a: &BeanHandle, b: &BeanHandle) -> bool {
    Arc::ptr_eq(a, b)
}
