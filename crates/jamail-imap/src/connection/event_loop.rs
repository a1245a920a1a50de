//! Readiness registration contract with the host event loop.

use std::cell::RefCell;
use std::rc::Rc;

/// Handle to a registered readiness watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Host event loop, bound to the socket of one session.
///
/// The host calls the session's `handle_readable` or `handle_writable`
/// while the matching watch is registered.
pub trait EventLoop {
    /// Registers interest in readability.
    fn watch_readable(&mut self) -> WatchId;
    /// Registers interest in writability.
    fn watch_writable(&mut self) -> WatchId;
    /// Removes a watch. Unknown ids are ignored.
    fn unwatch(&mut self, id: WatchId);
}

/// Bookkeeping for the watches of one socket.
///
/// Hosts that poll readiness themselves can hand the session a shared
/// `Rc<RefCell<WatchSet>>` and consult it before each wait.
#[derive(Debug, Default)]
pub struct WatchSet {
    next_id: u64,
    readable: Vec<WatchId>,
    writable: Vec<WatchId>,
}

impl WatchSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any readable watch is registered.
    #[must_use]
    pub fn wants_readable(&self) -> bool {
        !self.readable.is_empty()
    }

    /// Returns true if any writable watch is registered.
    #[must_use]
    pub fn wants_writable(&self) -> bool {
        !self.writable.is_empty()
    }

    /// Returns true if no watch is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readable.is_empty() && self.writable.is_empty()
    }

    const fn allocate(&mut self) -> WatchId {
        self.next_id += 1;
        WatchId(self.next_id)
    }
}

impl EventLoop for WatchSet {
    fn watch_readable(&mut self) -> WatchId {
        let id = self.allocate();
        self.readable.push(id);
        id
    }

    fn watch_writable(&mut self) -> WatchId {
        let id = self.allocate();
        self.writable.push(id);
        id
    }

    fn unwatch(&mut self, id: WatchId) {
        self.readable.retain(|w| *w != id);
        self.writable.retain(|w| *w != id);
    }
}

impl<E: EventLoop> EventLoop for Rc<RefCell<E>> {
    fn watch_readable(&mut self) -> WatchId {
        self.borrow_mut().watch_readable()
    }

    fn watch_writable(&mut self) -> WatchId {
        self.borrow_mut().watch_writable()
    }

    fn unwatch(&mut self, id: WatchId) {
        self.borrow_mut().unwatch(id);
    }
}
