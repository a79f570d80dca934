//! Completion Adapter
//!
//! Brackets a function call with `enter()`/`exit()` and picks the single moment
//! to exit. The wrapped function states how it completes:
//!
//! - [`Completion::Ready`]: done on return, exit immediately;
//! - [`Completion::Pending`]: done when the returned future settles;
//! - with a [`GuardedCallback`] (`wrap_callback`): done when the callback is
//!   first invoked, or when the pending future settles, whichever is first.
//!
//! A panic in the wrapped function exits the context before unwinding
//! continues. Each call exits its context at most once.

use super::StdioContext;
use crate::error::ExitDisciplineError;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::warn;

/// How a wrapped function completes.
pub enum Completion<T> {
    Ready(T),
    Pending(BoxFuture<'static, T>),
}

impl<T> Completion<T> {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Completion::Pending(Box::pin(future))
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Ready(_) => f.write_str("Completion::Ready"),
            Completion::Pending(_) => f.write_str("Completion::Pending"),
        }
    }
}

/// Result of a wrapped call.
pub enum Outcome<T> {
    Ready(T),
    /// Still inside the context until this future completes.
    Pending(Scoped<T>),
}

impl<T> Outcome<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Pending(_) => None,
        }
    }

    /// Wait for the call to finish, whichever way it completes.
    pub async fn settle(self) -> Result<T, ExitDisciplineError> {
        match self {
            Outcome::Ready(value) => Ok(value),
            Outcome::Pending(scoped) => scoped.await,
        }
    }
}

impl<T> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ready(_) => f.write_str("Outcome::Ready"),
            Outcome::Pending(_) => f.write_str("Outcome::Pending"),
        }
    }
}

struct ExitOnceInner {
    context: StdioContext,
    fired: AtomicBool,
}

/// Exits its context the first time it fires; later fires do nothing.
#[derive(Clone)]
struct ExitOnce(Arc<ExitOnceInner>);

impl ExitOnce {
    fn new(context: &StdioContext) -> Self {
        Self(Arc::new(ExitOnceInner {
            context: context.clone(),
            fired: AtomicBool::new(false),
        }))
    }

    fn fire(&self) -> Result<(), ExitDisciplineError> {
        if self.0.fired.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.0.context.exit()
    }

    fn fired(&self) -> bool {
        self.0.fired.load(Ordering::Acquire)
    }

    /// Fire while a panic is propagating; the panic takes precedence.
    fn fire_unwinding(&self) {
        if let Err(err) = self.fire() {
            warn!(context = %self.0.context.id(), error = %err, "exit failed while unwinding a panic");
        }
    }
}

/// The caller's callback, wrapped so that its first invocation exits the
/// context.
#[derive(Clone)]
pub struct GuardedCallback<C> {
    callback: C,
    exit: ExitOnce,
}

impl<C> GuardedCallback<C> {
    /// Exit the context (first call only) and forward `args` to the callback.
    ///
    /// If a strict exit fails, the callback is not invoked.
    pub fn call<A, R>(&mut self, args: A) -> Result<R, ExitDisciplineError>
    where
        C: FnMut(A) -> R,
    {
        self.exit.fire()?;
        Ok((self.callback)(args))
    }

    /// Whether the context has already been exited for this call.
    pub fn has_fired(&self) -> bool {
        self.exit.fired()
    }
}

impl<C> fmt::Debug for GuardedCallback<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedCallback")
            .field("context", &self.exit.0.context.id())
            .field("fired", &self.exit.fired())
            .finish()
    }
}

/// Future that exits its context when the wrapped future completes.
#[must_use = "the context stays entered until this future completes"]
pub struct Scoped<T> {
    inner: BoxFuture<'static, T>,
    exit: ExitOnce,
}

impl<T> Future for Scoped<T> {
    type Output = Result<T, ExitDisciplineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match panic::catch_unwind(AssertUnwindSafe(|| this.inner.as_mut().poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => Poll::Ready(this.exit.fire().map(|()| value)),
            Err(payload) => {
                this.exit.fire_unwinding();
                panic::resume_unwind(payload)
            }
        }
    }
}

impl<T> fmt::Debug for Scoped<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("context", &self.exit.0.context.id())
            .field("settled", &self.exit.fired())
            .finish()
    }
}

/// Run `f`, firing `exit` before letting a panic continue.
fn invoke<R>(exit: &ExitOnce, f: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            exit.fire_unwinding();
            panic::resume_unwind(payload)
        }
    }
}

impl StdioContext {
    /// Wrap `f` so that each call runs inside this context.
    ///
    /// The context is exited when `f` returns [`Completion::Ready`], when the
    /// future in [`Completion::Pending`] completes, or when `f` panics.
    pub fn wrap<A, T, F>(&self, mut f: F) -> impl FnMut(A) -> Result<Outcome<T>, ExitDisciplineError>
    where
        F: FnMut(A) -> Completion<T>,
    {
        let context = self.clone();
        move |args| context.exec(|| f(args))
    }

    /// Call `f` inside this context; see [`StdioContext::wrap`].
    pub fn exec<T>(
        &self,
        f: impl FnOnce() -> Completion<T>,
    ) -> Result<Outcome<T>, ExitDisciplineError> {
        let exit = ExitOnce::new(self);
        self.enter();
        match invoke(&exit, f) {
            Completion::Pending(inner) => Ok(Outcome::Pending(Scoped { inner, exit })),
            Completion::Ready(value) => {
                exit.fire()?;
                Ok(Outcome::Ready(value))
            }
        }
    }

    /// Wrap a callback-style `f`: each call passes the caller's callback
    /// through a [`GuardedCallback`], and the context stays entered until that
    /// callback is first invoked (or a pending future completes, or `f`
    /// panics). Returning [`Completion::Ready`] does not exit.
    pub fn wrap_callback<A, C, T, F>(
        &self,
        mut f: F,
    ) -> impl FnMut(A, C) -> Result<Outcome<T>, ExitDisciplineError>
    where
        F: FnMut(A, GuardedCallback<C>) -> Completion<T>,
    {
        let context = self.clone();
        move |args, callback| context.exec_callback(callback, |guarded| f(args, guarded))
    }

    /// Call a callback-style `f` inside this context; see
    /// [`StdioContext::wrap_callback`].
    pub fn exec_callback<C, T>(
        &self,
        callback: C,
        f: impl FnOnce(GuardedCallback<C>) -> Completion<T>,
    ) -> Result<Outcome<T>, ExitDisciplineError> {
        let exit = ExitOnce::new(self);
        let guarded = GuardedCallback {
            callback,
            exit: exit.clone(),
        };
        self.enter();
        match invoke(&exit, || f(guarded)) {
            Completion::Pending(inner) => Ok(Outcome::Pending(Scoped { inner, exit })),
            Completion::Ready(value) => Ok(Outcome::Ready(value)),
        }
    }

    /// Wrap a synchronous `f`: enter, call, and exit on return or panic.
    pub fn wrap_sync<A, R, F>(&self, mut f: F) -> impl FnMut(A) -> Result<R, ExitDisciplineError>
    where
        F: FnMut(A) -> R,
    {
        let context = self.clone();
        move |args| context.exec_sync(|| f(args))
    }

    /// Call a synchronous `f` inside this context.
    pub fn exec_sync<R>(&self, f: impl FnOnce() -> R) -> Result<R, ExitDisciplineError> {
        self.enter();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                self.exit()?;
                Ok(value)
            }
            Err(payload) => {
                if let Err(err) = self.exit() {
                    warn!(context = %self.id(), error = %err, "exit failed while unwinding a panic");
                }
                panic::resume_unwind(payload)
            }
        }
    }
}
