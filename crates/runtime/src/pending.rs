use std::collections::BTreeMap;

/// Ticket identifying one asynchronous request issued to a collaborator.
///
/// Tickets are never reused within one [`PendingRequests`], so a late answer can
/// always be matched (or not) against the request it belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Bookkeeping for in-flight requests on a single-threaded event timeline.
///
/// Each request carries a caller-defined context `T` that is handed back when the
/// answer arrives. Requests are not cancelled at the collaborator: callers decide
/// whether a resolved answer is still relevant.
#[derive(Debug)]
pub struct PendingRequests<T> {
    next_id: u64,
    pending: BTreeMap<RequestId, T>,
}

impl<T> Default for PendingRequests<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: BTreeMap::new(),
        }
    }
}

impl<T> PendingRequests<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, context: T) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.insert(id, context);
        id
    }

    /// Removes `id` and returns its context; `None` for unknown or already resolved tickets.
    pub fn resolve(&mut self, id: RequestId) -> Option<T> {
        self.pending.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forgets every outstanding request. Their answers will resolve to `None`.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
