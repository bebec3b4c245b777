/// Identifies one issued request within its class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic request counter for one class of requests.
///
/// Only the most recently issued ticket is current; responses carrying any
/// other ticket are stale and must be dropped.
#[derive(Clone, Debug, Default)]
pub struct RequestSeq {
    issued: u64,
}

impl RequestSeq {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    /// Makes every outstanding ticket stale without issuing a request.
    pub fn invalidate(&mut self) {
        self.issued += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    pub fn last_issued(&self) -> u64 {
        self.issued
    }
}
