use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight guard for gated ledger operations.
///
/// At most one permit exists at a time; there is no queueing and no
/// reentrancy. Dropping the permit clears the busy flag, whichever path the
/// operation exits through.
#[derive(Debug, Default)]
pub struct MutationGate {
    busy: AtomicBool,
}

impl MutationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the gate, or `None` when an operation already holds it.
    pub fn try_acquire(&self) -> Option<GatePermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof that the holder is the one operation allowed in flight.
#[derive(Debug)]
pub struct GatePermit<'a> {
    gate: &'a MutationGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
