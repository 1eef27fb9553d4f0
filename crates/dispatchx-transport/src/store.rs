use core::cell::RefCell;
use core::marker::PhantomData;
use dispatchx_core::RequestContext;
use std::future::Future;
use std::sync::Arc;

type Slot = RefCell<Option<Arc<RequestContext>>>;

thread_local! {
    static THREAD_SLOT: Slot = const { RefCell::new(None) };
}

tokio::task_local! {
    static TASK_SLOT: Slot;
}

/// Request-scoped home of the current [`RequestContext`].
///
/// ## Scoping
/// Inside [`RequestContextStore::scope`] the slot belongs to the tokio task
/// and disappears with it. Everywhere else it belongs to the calling thread,
/// and [`RequestContextStore::enter`] guarantees it is cleared when the
/// request ends. Either way no other request can observe the binding.
pub struct RequestContextStore;

impl RequestContextStore {
    fn with_slot<R>(f: impl FnOnce(&Slot) -> R) -> R {
        if TASK_SLOT.try_with(|_| ()).is_ok() {
            TASK_SLOT.with(f)
        } else {
            THREAD_SLOT.with(f)
        }
    }

    pub fn bind(context: Arc<RequestContext>) {
        Self::with_slot(|slot| *slot.borrow_mut() = Some(context));
    }

    /// The bound context, or `None` outside request handling.
    pub fn current() -> Option<Arc<RequestContext>> {
        Self::with_slot(|slot| slot.borrow().clone())
    }

    pub fn is_bound() -> bool {
        Self::with_slot(|slot| slot.borrow().is_some())
    }

    pub fn clear() {
        let previous = Self::with_slot(|slot| slot.borrow_mut().take());
        if let Some(context) = previous {
            tracing::trace!("RequestContextStore: cleared binding for {}", context.resource_uri());
        }
    }

    /// Starts a synchronous request on this thread. The slot is cleared now
    /// and again when the guard drops, including during unwinding.
    pub fn enter() -> ContextGuard {
        Self::clear();
        ContextGuard { _not_send: PhantomData }
    }

    /// Runs `future` with its own task-local slot, released together with
    /// the future whether it completes, fails or is cancelled.
    pub async fn scope<F: Future>(future: F) -> F::Output {
        TASK_SLOT.scope(RefCell::new(None), future).await
    }
}

/// Clears the thread's binding on drop. Tied to the thread that created it.
#[must_use = "the binding is cleared as soon as the guard is dropped"]
pub struct ContextGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        RequestContextStore::clear();
    }
}
