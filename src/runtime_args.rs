//! Runtime-argument resolution: values supplied at the `resolve` call site
//! rather than pulled from the registry, consulted by factories via
//! `RuntimeArgs::current`. Scoped to the call with a thread-local stack, the
//! same pattern `internal/circular.rs` uses for the dependency stack.

use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static ARGS_STACK: RefCell<Vec<RuntimeArgs>> = RefCell::new(Vec::new());
}

/// A bag of extra, caller-supplied constructor arguments for one `resolve`
/// call, looked up by type.
#[derive(Clone, Default)]
pub struct RuntimeArgs {
    values: Vec<Arc<dyn Any + Send + Sync>>,
}

impl RuntimeArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one value to the bag, returning `self` for chaining.
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.push(Arc::new(value));
        self
    }

    /// Returns the first value of type `T` in the bag, if any.
    pub fn get<T: 'static>(&self) -> Option<Arc<T>> {
        self.values.iter().find_map(|v| v.clone().downcast::<T>().ok())
    }

    /// The args bag active for the current, in-progress `resolve_with_args`
    /// call on this thread, if any.
    pub fn current() -> Option<RuntimeArgs> {
        ARGS_STACK.with(|stack| stack.borrow().last().cloned())
    }

    pub(crate) fn push(args: RuntimeArgs) -> ArgsGuard {
        ARGS_STACK.with(|stack| stack.borrow_mut().push(args));
        ArgsGuard { _private: () }
    }
}

pub(crate) struct ArgsGuard {
    _private: (),
}

impl Drop for ArgsGuard {
    fn drop(&mut self) {
        ARGS_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
