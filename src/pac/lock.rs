// src/pac/lock.rs
//! Exclusive access to one engine instance.
//!
//! The lock is not tied to a guard's lifetime: a binding running deep inside
//! a script call can give it up around a blocking lookup with
//! [`EngineLock::unlocked`] and take it back before returning to the engine.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct EngineLock {
    held: Mutex<bool>,
    released: Condvar,
}

/// Holds the engine lock until dropped.
#[must_use = "the engine lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct EngineGuard<'a> {
    lock: &'a EngineLock,
}

/// Releases the engine lock until dropped, then takes it back.
#[derive(Debug)]
struct Unlocker<'a> {
    lock: &'a EngineLock,
}

impl EngineLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the engine is free.
    pub fn acquire(&self) -> EngineGuard<'_> {
        self.lock_raw();
        EngineGuard { lock: self }
    }

    pub fn is_held(&self) -> bool {
        *self.held.lock()
    }

    /// Runs `f` with the lock released. The caller must currently hold it.
    pub fn unlocked<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        debug_assert!(self.is_held(), "unlocked() called without holding the engine lock");
        self.unlock_raw();
        let _relock = Unlocker { lock: self };
        f()
    }

    fn lock_raw(&self) {
        let mut held = self.held.lock();
        while *held {
            self.released.wait(&mut held);
        }
        *held = true;
    }

    fn unlock_raw(&self) {
        let mut held = self.held.lock();
        *held = false;
        self.released.notify_one();
    }
}

impl Drop for EngineGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock_raw();
    }
}

impl Drop for Unlocker<'_> {
    fn drop(&mut self) {
        self.lock.lock_raw();
    }
}
