//! Search: iterative-deepening driver over the negamax core.

pub mod heuristics;
pub mod negamax;
pub mod ordering;
pub mod tt;

use std::time::{Duration, Instant};

use shakmaty::{Color, Move};
use tracing::debug;

use crate::board::SearchBoard;
use heuristics::{HistoryTable, KillerTable};
use negamax::{INF, MATE_THRESHOLD, SearchContext, negamax};
use tt::{DEFAULT_TT_CAPACITY, TranspositionTable};

/// Fraction of the time budget that may be spent before a new deepening
/// iteration is allowed to start. Once past `time_limit / 3.5`, the next
/// iteration is assumed to eat the rest of the budget.
const ITERATION_BUDGET_DIVISOR: f64 = 3.5;

/// Result of a completed move selection.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move of the deepest completed iteration, `None` when no
    /// iteration ran.
    pub best_move: Option<Move>,
    /// Score of that iteration, from the side-to-move's perspective.
    pub score: i32,
    /// Deepest completed depth (0 when no iteration ran).
    pub depth: i32,
}

/// Iterative-deepening searcher owning the transposition table, killer
/// table and history counters.
///
/// The tables persist across calls to [`search`](Searcher::search) within a
/// game: the transposition table accelerates later selections (probes are
/// depth-guarded, so staleness is harmless), killers are reset each call,
/// and history decays each call.
pub struct Searcher {
    tt: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
}

impl Searcher {
    /// Create a searcher with the default transposition-table capacity.
    pub fn new() -> Self {
        Self::with_tt_capacity(DEFAULT_TT_CAPACITY)
    }

    /// Create a searcher whose transposition table flushes at `capacity`
    /// entries.
    pub fn with_tt_capacity(capacity: usize) -> Self {
        Self {
            tt: TranspositionTable::new(capacity),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
        }
    }

    /// Pick a move for `engine` by iterative deepening.
    ///
    /// Depths `1..depth_limit` are searched in turn; the bound is
    /// exclusive, so `depth_limit` itself is never reached and a limit of 1
    /// completes no iteration. A new depth starts only while elapsed time
    /// is within `time_limit / 3.5`; the iteration in flight always runs to
    /// completion. A forced mate for the engine stops the deepening early.
    pub fn search(
        &mut self,
        board: &mut SearchBoard,
        engine: Color,
        depth_limit: u32,
        time_limit: Duration,
    ) -> SearchResult {
        self.tt.flush_if_full();
        self.killers.reset();
        self.history.decay();

        let start = Instant::now();
        let iteration_budget = time_limit.div_f64(ITERATION_BUDGET_DIVISOR);

        let mut result = SearchResult {
            best_move: None,
            score: 0,
            depth: 0,
        };

        for depth in 1..depth_limit as i32 {
            if start.elapsed() > iteration_budget {
                debug!(depth, "time budget exhausted before iteration");
                break;
            }

            let mut ctx = SearchContext {
                tt: &mut self.tt,
                killers: &mut self.killers,
                history: &mut self.history,
                engine,
            };
            let (score, best_move) = negamax(board, -INF, INF, depth, 0, &mut ctx);

            result = SearchResult {
                best_move,
                score,
                depth,
            };
            debug!(
                depth,
                score,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "iteration complete"
            );

            if score > MATE_THRESHOLD {
                break;
            }
        }

        result
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher").field("tt", &self.tt).finish()
    }
}
