//! Composition of several abort sources into one signal
//!
//! The composed signal fires with the reason of whichever source fires
//! first: an input signal, or the optional timeout timer. On firing it
//! detaches from every remaining source and stops its timer. Callers release
//! it explicitly with [`ComposedSignal::unsubscribe`] or by dropping it.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::signal::{AbortController, AbortSignal, ListenerId};
use crate::error::{self, Error};

/// How an elapsed timeout is reported.
#[derive(Debug, Clone, Default)]
pub struct TimeoutOptions {
    /// Report `ETIMEDOUT` instead of `ECONNABORTED`
    pub clarify_timeout_error: bool,
    /// Replaces the default `timeout of {ms}ms exceeded` message
    pub timeout_error_message: Option<String>,
}

#[derive(Default)]
struct Subscriptions {
    sources: Vec<(AbortSignal, ListenerId)>,
    timer: Option<JoinHandle<()>>,
    released: bool,
}

struct ComposedCore {
    controller: AbortController,
    subscriptions: Mutex<Subscriptions>,
}

impl ComposedCore {
    fn fire(&self, reason: &Error) {
        let reason = if reason.is_canceled() || reason.is_timeout() {
            reason.clone()
        } else {
            error::canceled_with_message(reason.to_string()).with(reason.clone())
        };
        self.release();
        self.controller.abort_with(reason);
    }

    fn release(&self) {
        let subscriptions = {
            let mut guard = self
                .subscriptions
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if guard.released {
                return;
            }
            guard.released = true;
            std::mem::take(&mut *guard)
        };

        if let Some(timer) = subscriptions.timer {
            timer.abort();
        }
        for (source, id) in subscriptions.sources {
            source.unsubscribe(id);
        }
    }
}

/// One signal aggregating several abort sources and an optional timeout.
pub struct ComposedSignal {
    core: Arc<ComposedCore>,
}

impl ComposedSignal {
    /// The unified signal, to be handed to whoever must observe it.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        self.core.controller.signal()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.core.controller.signal().is_aborted()
    }

    #[must_use]
    pub fn reason(&self) -> Option<Error> {
        self.core.controller.signal().reason()
    }

    /// Detach from every source and stop the timer without firing.
    ///
    /// Idempotent.
    pub fn unsubscribe(&self) {
        self.core.release();
    }
}

impl Drop for ComposedSignal {
    fn drop(&mut self) {
        self.core.release();
    }
}

impl std::fmt::Debug for ComposedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedSignal")
            .field("signal", &self.core.controller.signal())
            .finish_non_exhaustive()
    }
}

/// Merge `sources` and an optional `timeout` into a single signal.
///
/// Returns `None` when there is nothing that could ever fire. A zero
/// timeout fires before this returns.
///
/// # Panics
///
/// Spawning the timeout timer requires a running Tokio runtime.
pub fn compose_signals<'a, I>(
    sources: I,
    timeout: Option<Duration>,
    options: &TimeoutOptions,
) -> Option<ComposedSignal>
where
    I: IntoIterator<Item = Option<&'a AbortSignal>>,
{
    let sources: Vec<AbortSignal> = sources.into_iter().flatten().cloned().collect();
    if sources.is_empty() && timeout.is_none() {
        return None;
    }

    let core = Arc::new(ComposedCore {
        controller: AbortController::new(),
        subscriptions: Mutex::new(Subscriptions::default()),
    });

    for source in sources {
        let weak: Weak<ComposedCore> = Arc::downgrade(&core);
        let id = source.subscribe(move |reason| {
            if let Some(core) = weak.upgrade() {
                core.fire(reason);
            }
        });

        // `None` means the source had already fired and the listener ran.
        let Some(id) = id else { break };

        let mut subscriptions = core
            .subscriptions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if subscriptions.released {
            drop(subscriptions);
            source.unsubscribe(id);
            break;
        }
        subscriptions.sources.push((source, id));
    }

    if let Some(timeout) = timeout {
        let reason = error::timeout(
            timeout,
            options.timeout_error_message.as_deref(),
            options.clarify_timeout_error,
        );
        if timeout.is_zero() {
            core.fire(&reason);
            return Some(ComposedSignal { core });
        }

        let mut subscriptions = core
            .subscriptions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !subscriptions.released {
            let weak = Arc::downgrade(&core);
            subscriptions.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(core) = weak.upgrade() {
                    core.fire(&reason);
                }
            }));
        }
    }

    Some(ComposedSignal { core })
}
