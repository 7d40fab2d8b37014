//! Single-fire abort signals with an explicit observer list
//!
//! An `AbortController` owns the right to fire; any number of cloned
//! `AbortSignal`s observe it. Observers are either synchronous listeners
//! (used by signal composition) or tasks awaiting [`AbortSignal::aborted`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::error::{self, Error, Result};

type Listener = Box<dyn FnOnce(&Error) + Send>;

/// Handle returned by [`AbortSignal::subscribe`], used to detach a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct SignalState {
    reason: Option<Error>,
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

struct SignalInner {
    state: Mutex<SignalState>,
    fired: watch::Sender<bool>,
}

impl SignalInner {
    fn lock(&self) -> MutexGuard<'_, SignalState> {
        // Listeners never run under the lock, so a poisoned lock still holds
        // consistent state.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Observer side of an abort source.
#[derive(Clone)]
pub struct AbortSignal {
    inner: Arc<SignalInner>,
}

/// Owner side of an abort source.
#[derive(Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

impl Default for AbortSignal {
    fn default() -> Self {
        let (fired, _) = watch::channel(false);
        Self {
            inner: Arc::new(SignalInner {
                state: Mutex::new(SignalState {
                    reason: None,
                    listeners: Vec::new(),
                    next_id: 0,
                }),
                fired,
            }),
        }
    }
}

impl AbortController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The signal observed by requests.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Fire with the default `Canceled` reason.
    ///
    /// Returns false if the signal had already fired.
    pub fn abort(&self) -> bool {
        self.signal.fire(error::canceled())
    }

    /// Fire with an explicit reason.
    ///
    /// Returns false if the signal had already fired; the first reason wins.
    pub fn abort_with(&self, reason: Error) -> bool {
        self.signal.fire(reason)
    }
}

impl AbortSignal {
    /// A signal that has already fired with `reason`.
    #[must_use]
    pub fn aborted_with(reason: Error) -> Self {
        let signal = Self::default();
        signal.fire(reason);
        signal
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.lock().reason.is_some()
    }

    /// The reason the signal fired with, once it has fired.
    #[must_use]
    pub fn reason(&self) -> Option<Error> {
        self.inner.lock().reason.clone()
    }

    /// Fails with the abort reason if the signal has fired.
    ///
    /// # Errors
    ///
    /// Returns the reason the signal fired with.
    pub fn throw_if_aborted(&self) -> Result<()> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Resolves with the abort reason once the signal fires.
    pub async fn aborted(&self) -> Error {
        let mut fired = self.inner.fired.subscribe();
        // The sender lives as long as `self`, so the channel cannot close
        // while we wait.
        let _ = fired.wait_for(|fired| *fired).await;
        self.reason().unwrap_or_else(error::canceled)
    }

    /// Registers a listener that runs once, when the signal fires.
    ///
    /// A signal that already fired runs the listener immediately and returns
    /// `None`, since there is nothing left to unsubscribe.
    pub fn subscribe<F>(&self, listener: F) -> Option<ListenerId>
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        let mut state = self.inner.lock();
        if let Some(reason) = state.reason.clone() {
            drop(state);
            listener(&reason);
            return None;
        }
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, Box::new(listener)));
        Some(id)
    }

    /// Detaches a listener. Unknown or already-fired ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.inner.lock().listeners.retain(|(listener, _)| *listener != id);
    }

    /// Number of listeners still attached.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    fn fire(&self, reason: Error) -> bool {
        let listeners = {
            let mut state = self.inner.lock();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.clone());
            std::mem::take(&mut state.listeners)
        };

        for (_, listener) in listeners {
            listener(&reason);
        }
        self.inner.fired.send_replace(true);
        true
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("AbortSignal")
            .field("aborted", &state.reason.is_some())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl fmt::Debug for AbortController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortController")
            .field("signal", &self.signal)
            .finish()
    }
}
