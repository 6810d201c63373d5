//! Bounded pool of identical servers with FIFO admission.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

/// Opaque token proving that its owner holds one server of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ServerHandle(u64);

/// Outcome of a server request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// A server was free and is now held by the requester.
    Granted(ServerHandle),
    /// All servers are busy; the requester waits at the given 0-based position of the queue.
    Queued { position: usize },
}

/// A server handed over to a waiting requester on release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grant<R> {
    pub requester: R,
    pub handle: ServerHandle,
}

/// Pool of `capacity` servers shared by requesters of type `R`.
///
/// At most `capacity` handles are outstanding at any time. Requesters that find all servers busy
/// wait in a single FIFO queue, and every release hands the freed server directly to the
/// longest-waiting requester, so a server never sits idle while someone is waiting.
pub struct ServerPool<R> {
    capacity: usize,
    holders: HashSet<ServerHandle>,
    waiting: VecDeque<R>,
    next_handle: u64,
}

impl<R> ServerPool<R> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "server pool capacity must be positive");
        Self {
            capacity,
            holders: HashSet::with_capacity(capacity),
            waiting: VecDeque::new(),
            next_handle: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of servers currently held.
    pub fn busy(&self) -> usize {
        self.holders.len()
    }

    /// Number of requesters waiting for a server.
    pub fn queue_len(&self) -> usize {
        self.waiting.len()
    }

    /// Requests a server, granting it immediately if one is free and queueing the requester otherwise.
    pub fn request(&mut self, requester: R) -> Admission {
        if self.holders.len() < self.capacity {
            Admission::Granted(self.acquire())
        } else {
            self.waiting.push_back(requester);
            Admission::Queued {
                position: self.waiting.len() - 1,
            }
        }
    }

    /// Returns a server to the pool.
    ///
    /// If somebody is waiting, the server is immediately granted to the head of the queue and the grant is
    /// returned, so that the caller can resume the new holder. Panics if the handle is not held, as this
    /// means a server is released twice.
    pub fn release(&mut self, handle: ServerHandle) -> Option<Grant<R>> {
        assert!(
            self.holders.remove(&handle),
            "released server {:?} is not held by anybody",
            handle
        );
        let requester = self.waiting.pop_front()?;
        Some(Grant {
            requester,
            handle: self.acquire(),
        })
    }

    fn acquire(&mut self) -> ServerHandle {
        let handle = ServerHandle(self.next_handle);
        self.next_handle += 1;
        self.holders.insert(handle);
        handle
    }
}
