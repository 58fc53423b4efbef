//! Prototype in-creation tracking.
//!
//! Prototypes have no registry slot and no early-reference tier, so cycle
//! participation cannot be resolved for them; it can only be detected. The
//! ledger is thread-local: a prototype mid-creation on one thread says
//! nothing about another thread's resolution.

use std::cell::RefCell;

use crate::error::{BeansError, BeansResult};

thread_local! {
    static PROTOTYPES_IN_CREATION: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Guard marking a prototype bean as in-creation on the current thread.
///
/// Re-entering creation for the same name before the guard drops means the
/// resolution path circled back through this prototype, which is fatal.
pub(crate) struct PrototypeGuard {
    name: String,
}

impl PrototypeGuard {
    pub(crate) fn enter(name: &str) -> BeansResult<Self> {
        PROTOTYPES_IN_CREATION.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|n| n == name) {
                return Err(BeansError::UnresolvableCircularReference(name.to_string()));
            }
            stack.push(name.to_string());
            Ok(())
        })?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl Drop for PrototypeGuard {
    fn drop(&mut self) {
        PROTOTYPES_IN_CREATION.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|n| n == &self.name) {
                stack.remove(pos);
            }
        });
    }
}
