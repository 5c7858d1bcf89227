//! Single-shot correlation between an engine callback and a waitable
//! result.
//!
//! [`channel`] links a [`Resolver`] to an [`Operation`]. The resolver is
//! consumed by settling, so a completion callback built around it can only
//! ever fire once; the type system carries the exactly-once guarantee the
//! boundary relies on. Progress reporting never travels through this
//! channel — it is an independent, repeatable callback.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

use crate::error::BridgeError;

/// Create a linked resolver/operation pair.
pub fn channel<T>() -> (Resolver<T>, Operation<T>) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Resolver { tx }, Operation { rx })
}

/// Settles exactly one [`Operation`].
///
/// Dropping an unsettled resolver makes the paired operation report
/// [`BridgeError::Disconnected`].
pub struct Resolver<T> {
    tx: SyncSender<Result<T, BridgeError>>,
}

impl<T> Resolver<T> {
    /// Deliver the operation's outcome.
    pub fn settle(self, outcome: Result<T, BridgeError>) {
        // The caller may have dropped the operation handle; the engine's
        // work still ran, there is nowhere left to report to.
        let _ = self.tx.send(outcome);
    }

    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(self, error: impl Into<BridgeError>) {
        self.settle(Err(error.into()));
    }
}

/// A single-shot asynchronous result.
///
/// Not cancellable: dropping the handle does not stop the underlying engine
/// work.
pub struct Operation<T> {
    rx: Receiver<Result<T, BridgeError>>,
}

impl<T> Operation<T> {
    /// An operation that already settled, for failures detected before any
    /// engine call was issued.
    pub fn settled(outcome: Result<T, BridgeError>) -> Self {
        let (resolver, operation) = channel();
        resolver.settle(outcome);
        operation
    }

    /// Block until the operation settles.
    pub fn wait(self) -> Result<T, BridgeError> {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::Disconnected),
        }
    }

    /// Check for a settled outcome without blocking.
    pub fn try_wait(&self) -> Option<Result<T, BridgeError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(BridgeError::Disconnected)),
        }
    }
}
