//! Nested scope tracking (spec §4.5): a per-thread stack of scopes where at
//! most one child scope may be live under a given parent at a time.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::{Scope, ServiceProvider};
use crate::error::{DiError, DiResult};
use crate::traits::ResolverCore;

struct ScopeNode {
    scope: Scope,
    has_child: bool,
}

thread_local! {
    static SCOPE_STACK: RefCell<Vec<Rc<RefCell<ScopeNode>>>> = RefCell::new(Vec::new());
}

/// A nested scope tracked on the current thread's scope stack (spec §4.5).
/// Dropping without calling `end_scope` still releases it from the stack,
/// same as an explicit `end_scope`.
pub struct ScopeHandle {
    node: Rc<RefCell<ScopeNode>>,
    ended: std::cell::Cell<bool>,
}

impl ScopeHandle {
    /// The scope tracked by this handle.
    pub fn scope(&self) -> Scope {
        self.node.borrow().scope.clone()
    }

    /// Ends this scope. Fails if it isn't the innermost scope on the current
    /// thread's stack.
    pub fn end_scope(self) -> DiResult<()> {
        self.end_inner()
    }

    fn end_inner(&self) -> DiResult<()> {
        if self.ended.get() {
            return Ok(());
        }
        SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.last() {
                Some(top) if Rc::ptr_eq(top, &self.node) => {
                    stack.pop();
                    if let Some(parent) = stack.last() {
                        parent.borrow_mut().has_child = false;
                    }
                    self.ended.set(true);
                    Ok(())
                }
                _ => Err(DiError::InvalidScope(
                    "scope ended while not the innermost scope on this thread".into(),
                )),
            }
        })
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        let _ = self.end_inner();
    }
}

impl ServiceProvider {
    /// Begins a nested scope tracked on the current thread's scope stack.
    /// At most one child scope may be live under a given parent at a time;
    /// beginning a second returns `DiError::InvalidScope`.
    pub fn begin_scope(&self) -> DiResult<ScopeHandle> {
        SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(top) = stack.last() {
                if top.borrow().has_child {
                    return Err(DiError::InvalidScope(
                        "parent scope already has a live child scope".into(),
                    ));
                }
                top.borrow_mut().has_child = true;
            }
            let node = Rc::new(RefCell::new(ScopeNode {
                scope: self.create_scope(),
                has_child: false,
            }));
            stack.push(node.clone());
            Ok(ScopeHandle { node, ended: std::cell::Cell::new(false) })
        })
    }
}

/// Tracks `service` for disposal by the innermost open scope on the current
/// thread, if any.
pub fn track_in_current_scope<T: crate::traits::Dispose + 'static>(service: Arc<T>) -> DiResult<()> {
    SCOPE_STACK.with(|stack| {
        let stack = stack.borrow();
        match stack.last() {
            Some(top) => {
                top.borrow().scope.push_sync_disposer(Box::new(move || service.dispose()));
                Ok(())
            }
            None => Err(DiError::InvalidScope("no open scope on the current thread".into())),
        }
    })
}
