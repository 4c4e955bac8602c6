// SPDX-License-Identifier: MPL-2.0

//! Observable value cell
//!
//! A single-writer cell that notifies its observers only when a write
//! actually changes the value. Observers either register a callback with
//! [`Observable::observe`] or hold a [`watch::Receiver`] from
//! [`Observable::subscribe`] for async and polling consumers.

use tokio::sync::watch;

/// Handle returned by [`Observable::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Box<dyn FnMut(&T) + Send>;

/// Value cell with change notification on inequality
pub struct Observable<T> {
    sender: watch::Sender<T>,
    listeners: Vec<(ListenerId, Listener<T>)>,
    next_listener: u64,
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            sender: watch::Sender::new(initial),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Store `value` if it differs from the current one
    ///
    /// Returns true and notifies every observer when the value changed.
    /// Writing an equal value is silent.
    pub fn set(&mut self, value: T) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });

        if changed {
            let current = self.get();
            for (_, listener) in &mut self.listeners {
                listener(&current);
            }
        }

        changed
    }

    /// Receiver that is marked changed on every distinct write
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    /// Register a callback run after each distinct write
    pub fn observe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&T) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unobserve(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Number of registered callbacks
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: Clone + PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.sender.borrow())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
