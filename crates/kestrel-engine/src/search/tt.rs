//! Bounded transposition table.
//!
//! A hash map from Zobrist key to the deepest known result for that
//! position. The table is a hint cache, not correctness-critical, so the
//! overflow policy is deliberately blunt: a store at capacity flushes the
//! whole table before inserting. Entries persist across move selections
//! within a game, which is safe because probes are depth-guarded.

use std::collections::HashMap;

use shakmaty::Move;
use tracing::debug;

/// Default entry capacity before a store triggers a full flush.
pub const DEFAULT_TT_CAPACITY: usize = 1_000_000;

/// How a stored score bounds the true value of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The score is exact (it fell inside the search window).
    Exact,
    /// The score is a lower bound (the node failed high).
    LowerBound,
    /// The score is an upper bound (the node failed low).
    UpperBound,
}

/// One transposition-table entry.
#[derive(Debug, Clone)]
pub struct TtEntry {
    /// Score from the side-to-move's perspective.
    pub score: i32,
    /// Remaining depth at which the score was computed.
    pub depth: i32,
    /// Whether `score` is exact or a bound.
    pub bound: Bound,
    /// Best move found at this position, if any.
    pub best_move: Option<Move>,
}

/// Bounded map from position key to [`TtEntry`].
pub struct TranspositionTable {
    entries: HashMap<u64, TtEntry>,
    capacity: usize,
}

impl TranspositionTable {
    /// Create an empty table that flushes at `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Look up the entry for a position key.
    pub fn probe(&self, key: u64) -> Option<&TtEntry> {
        self.entries.get(&key)
    }

    /// Store an entry, flushing the whole table first if it is full.
    ///
    /// Later stores for the same key overwrite earlier ones.
    pub fn store(&mut self, key: u64, entry: TtEntry) {
        self.flush_if_full();
        self.entries.insert(key, entry);
    }

    /// Flush everything once the table has reached capacity.
    pub fn flush_if_full(&mut self) {
        if self.entries.len() >= self.capacity {
            debug!(entries = self.entries.len(), "transposition table flushed at capacity");
            self.entries.clear();
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("entries", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
