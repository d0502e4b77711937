use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use shared_models::EntityKind;

/// Monotonic identifier source for one entity kind.
///
/// Identifiers are the kind prefix followed by a zero-padded sequence number
/// (`A001`, `A002`, ...). Numbers past the padding width simply grow wider.
#[derive(Debug)]
pub struct IdSequence {
    kind: EntityKind,
    width: usize,
    last: AtomicU64,
}

impl IdSequence {
    pub fn new(kind: EntityKind, width: usize) -> Self {
        Self {
            kind,
            width: width.max(1),
            last: AtomicU64::new(0),
        }
    }

    /// Reserve and format the next identifier.
    pub fn next_id(&self) -> String {
        let number = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        self.format(number)
    }

    pub fn format(&self, number: u64) -> String {
        format!("{}{:0width$}", self.kind.id_prefix(), number, width = self.width)
    }

    /// Advance the counter past an identifier that already exists, so loaded
    /// records never collide with freshly issued ones.
    pub fn observe(&self, id: &str) -> bool {
        match parse_suffix(self.kind, id) {
            Some(number) => {
                self.last.fetch_max(number, Ordering::SeqCst);
                debug!("Observed {} id {}", self.kind, id);
                true
            }
            None => {
                warn!("Ignoring malformed {} id '{}'", self.kind, id);
                false
            }
        }
    }

    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

/// Numeric part of an identifier of the given kind, if it is well formed.
pub fn parse_suffix(kind: EntityKind, id: &str) -> Option<u64> {
    let digits = id.strip_prefix(kind.id_prefix())?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
