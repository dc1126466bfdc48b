//! Circular dependency detection infrastructure.
//!
//! The dependency stack lives in thread-local storage, never on the
//! container, so concurrent resolves on different threads never interfere
//! with each other (spec §5: "per-call or per-thread, never global"). The
//! one structural exception named by the spec — a decorator's edge to the
//! emitter it wraps — never reaches this stack at all: a decorator chain is
//! built at compile time by directly nesting closures (see `compiler.rs`),
//! so "decorating IFoo while resolving IFoo" never re-enters `resolve`.

use std::cell::RefCell;
use std::panic;

const MAX_DEPTH: usize = 1024;

thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<String>,
    frozen: bool,
    depth: usize,
}

/// Panic payload for circular dependency detection.
///
/// Example path: `["ServiceA", "ServiceB", "ServiceC", "ServiceA"]`.
#[derive(Debug)]
pub struct CircularPanic {
    /// The complete circular dependency path showing the cycle.
    pub path: Box<[String]>,
}

impl CircularPanic {
    fn new(path: Vec<String>) -> Self {
        CircularPanic { path: path.into_boxed_slice() }
    }
}

/// Guard for managing the thread-local resolution stack.
pub(crate) struct StackGuard {
    name: String,
}

impl StackGuard {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();

            if tls.stack.iter().any(|n| n == &name) {
                let mut path = tls.stack.clone();
                path.push(name.clone());
                tls.frozen = true;
                panic::panic_any(CircularPanic::new(path));
            }

            if tls.depth >= MAX_DEPTH {
                panic::panic_any(crate::error::DiError::DepthExceeded(tls.depth));
            }

            tls.stack.push(name.clone());
            tls.depth += 1;
        });

        Self { name }
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            if !tls.frozen {
                if let Some(last) = tls.stack.pop() {
                    debug_assert_eq!(last, self.name);
                }
                tls.depth = tls.depth.saturating_sub(1);
            }
        });
    }
}

/// Runs `f` with `name` pushed onto the per-thread dependency stack,
/// turning re-entrant resolution of the same emitter into a clean
/// `DiError::CyclicDependency` instead of an infinite recursion/stack
/// overflow. Clears the stack on the way out so an unrelated resolve right
/// after a cycle error starts from a clean slate (spec §7: "the dependency
/// stack is cleared").
pub(crate) fn with_circular_catch<T, F>(name: impl Into<String>, f: F) -> crate::error::DiResult<T>
where
    F: FnOnce() -> crate::error::DiResult<T>,
{
    use std::panic::AssertUnwindSafe;

    let _guard = StackGuard::new(name);

    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            if let Some(circular_panic) = payload.downcast_ref::<CircularPanic>() {
                RESOLUTION_TLS.with(|tls| {
                    let mut tls = tls.borrow_mut();
                    tls.stack.clear();
                    tls.depth = 0;
                    tls.frozen = false;
                });
                Err(crate::error::DiError::CyclicDependency(circular_panic.path.to_vec()))
            } else {
                std::panic::resume_unwind(payload);
            }
        }
    }
}
