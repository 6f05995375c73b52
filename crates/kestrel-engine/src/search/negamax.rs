//! Negamax alpha-beta search with transposition table, null-move pruning
//! and a capture-only quiescence search.

use shakmaty::{Color, Move, Position};

use crate::board::SearchBoard;
use crate::eval::evaluate;
use crate::search::heuristics::{HistoryTable, KillerTable};
use crate::search::ordering::{OrderedMoves, noisy_moves};
use crate::search::tt::{Bound, TranspositionTable, TtEntry};

/// Score representing an unreachable upper/lower bound.
pub const INF: i32 = 1_000_000_000;

/// Scores above this threshold indicate a forced mate.
pub const MATE_THRESHOLD: i32 = 90_000_000;

/// Ply ceiling for the killer table.
pub const MAX_PLY: usize = 16;

/// Depth reduction applied to the null-move search.
const NULL_MOVE_REDUCTION: i32 = 2;

/// Minimum remaining depth for null-move pruning.
const NULL_MOVE_MIN_DEPTH: i32 = 3;

/// Quiescence delta-pruning margin: a queen (~900) plus a safety buffer.
const DELTA_MARGIN: i32 = 1050;

/// Search state threaded through the recursion.
pub(super) struct SearchContext<'a> {
    /// Transposition table, persistent across move selections.
    pub tt: &'a mut TranspositionTable,
    /// Killer moves per ply.
    pub killers: &'a mut KillerTable,
    /// History heuristic counters.
    pub history: &'a mut HistoryTable,
    /// The color the engine is playing; evaluation is from this side.
    pub engine: Color,
}

/// Whether the side to move has any piece besides pawns and the king.
///
/// Null-move pruning is unsound in such positions (zugzwang), so this
/// gates it.
fn has_non_pawn_material(board: &SearchBoard) -> bool {
    let pos = board.position();
    let pawns_and_kings = pos.board().pawns() | pos.board().kings();
    !(pos.us() & !pawns_and_kings).is_empty()
}

/// Alpha-beta negamax.
///
/// Returns the score from the side-to-move's perspective together with the
/// best move found, `None` at terminal and horizon nodes. The caller must
/// not rely on the move when the score is `-INF` (no move was searched).
pub(super) fn negamax(
    board: &mut SearchBoard,
    mut alpha: i32,
    mut beta: i32,
    depth: i32,
    ply: usize,
    ctx: &mut SearchContext<'_>,
) -> (i32, Option<Move>) {
    let original_alpha = alpha;
    let key = board.key();

    // TT probe. The stored move seeds ordering regardless of entry depth;
    // score cutoffs require at least the remaining depth.
    let mut tt_move: Option<Move> = None;
    if let Some(entry) = ctx.tt.probe(key) {
        tt_move = entry.best_move;
        if entry.depth >= depth {
            match entry.bound {
                Bound::Exact => return (entry.score, entry.best_move),
                Bound::LowerBound => alpha = alpha.max(entry.score),
                Bound::UpperBound => beta = beta.min(entry.score),
            }
            if alpha >= beta {
                return (entry.score, entry.best_move);
            }
        }
    }

    // Terminal: score the final position. The evaluator speaks from the
    // engine's perspective; re-sign for the side to move, and pull mates
    // found deeper in the tree toward the root so shorter mates win.
    if board.is_game_over() {
        let raw = evaluate(board, ctx.engine);
        let score = if board.turn() == ctx.engine {
            raw
        } else {
            let mut flipped = -raw;
            if flipped > MATE_THRESHOLD {
                flipped -= ply as i32;
            }
            flipped
        };
        return (score, None);
    }

    // Horizon: resolve captures before trusting the static score.
    if depth <= 0 {
        return (quiescence(board, alpha, beta, ctx), None);
    }

    // Null-move pruning: hand the opponent a free move and search reduced
    // with a zero window. If we still clear beta, the real position will
    // too. Skipped in check, at the root, and without non-pawn material.
    if depth >= NULL_MOVE_MIN_DEPTH
        && ply > 0
        && !board.is_check()
        && has_non_pawn_material(board)
        && board.push_null()
    {
        let (child, _) = negamax(
            board,
            -beta,
            -beta + 1,
            depth - 1 - NULL_MOVE_REDUCTION,
            ply + 1,
            ctx,
        );
        board.pop();
        if -child >= beta {
            return (beta, None);
        }
    }

    let killers = ctx.killers.at(ply);
    let ordered = OrderedMoves::new(board, tt_move, killers, ctx.history);

    let mut best_score = -INF;
    let mut best_move: Option<Move> = None;

    for mv in ordered {
        board.push(mv);
        let (child, _) = negamax(board, -beta, -alpha, depth - 1, ply + 1, ctx);
        board.pop();
        let score = -child;

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            alpha = alpha.max(score);
        }

        if best_score >= beta {
            // Quiet cutoff moves feed the ordering heuristics.
            if !mv.is_capture() && !mv.is_promotion() {
                ctx.killers.store(ply, mv);
                if let Some(from) = mv.from() {
                    ctx.history.reward(board.turn(), from, mv.to(), depth);
                }
            }
            break;
        }
    }

    let bound = if best_score <= original_alpha {
        Bound::UpperBound
    } else if best_score >= beta {
        Bound::LowerBound
    } else {
        Bound::Exact
    };
    ctx.tt.store(
        key,
        TtEntry {
            score: best_score,
            depth,
            bound,
            best_move,
        },
    );

    (best_score, best_move)
}

/// Quiescence search: only captures and promotions, until the position is
/// quiet.
///
/// Stand-pat gives the side to move the option of declining every capture.
/// The evaluator output is engine-relative, so it is negated when the
/// opponent is to move before use as the stand-pat score.
pub(super) fn quiescence(
    board: &mut SearchBoard,
    mut alpha: i32,
    beta: i32,
    ctx: &mut SearchContext<'_>,
) -> i32 {
    let mut stand_pat = evaluate(board, ctx.engine);
    if board.turn() != ctx.engine {
        stand_pat = -stand_pat;
    }

    if stand_pat >= beta {
        return stand_pat;
    }

    // Delta pruning: with no promotion imminent, a position more than a
    // queen below alpha will not be rescued by any capture sequence.
    if board.promotion_candidates().is_empty() && stand_pat < alpha - DELTA_MARGIN {
        return alpha;
    }

    if stand_pat > alpha {
        alpha = stand_pat;
    }

    for mv in noisy_moves(board) {
        board.push(mv);
        let score = -quiescence(board, -beta, -alpha, ctx);
        board.pop();

        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

#[cfg(test)]
mod tests {
    use shakmaty::fen::Fen;
    use shakmaty::{CastlingMode, Chess};

    use super::*;
    use crate::search::tt::DEFAULT_TT_CAPACITY;

    fn board(fen: &str) -> SearchBoard {
        SearchBoard::new(
            fen.parse::<Fen>()
                .unwrap()
                .into_position(CastlingMode::Standard)
                .unwrap(),
        )
    }

    struct Tables {
        tt: TranspositionTable,
        killers: KillerTable,
        history: HistoryTable,
    }

    impl Tables {
        fn fresh() -> Self {
            Self {
                tt: TranspositionTable::new(DEFAULT_TT_CAPACITY),
                killers: KillerTable::new(),
                history: HistoryTable::new(),
            }
        }

        fn ctx(&mut self, engine: Color) -> SearchContext<'_> {
            SearchContext {
                tt: &mut self.tt,
                killers: &mut self.killers,
                history: &mut self.history,
                engine,
            }
        }
    }

    /// Unpruned negamax over the same game tree: every move searched with
    /// a full window, the same terminal rule, and the same horizon rule.
    fn reference(
        board: &mut SearchBoard,
        depth: i32,
        ply: usize,
        ctx: &mut SearchContext<'_>,
    ) -> i32 {
        if board.is_game_over() {
            let raw = evaluate(board, ctx.engine);
            return if board.turn() == ctx.engine {
                raw
            } else {
                let mut flipped = -raw;
                if flipped > MATE_THRESHOLD {
                    flipped -= ply as i32;
                }
                flipped
            };
        }
        if depth <= 0 {
            return quiescence(board, -INF, INF, ctx);
        }

        let mut best = -INF;
        for mv in board.legal_moves() {
            board.push(mv);
            let score = -reference(board, depth - 1, ply + 1, ctx);
            board.pop();
            best = best.max(score);
        }
        best
    }

    /// Pruned and unpruned search must agree at full window. The fixtures
    /// are capture-sparse so the quiescence delta margin never fires.
    #[test]
    fn matches_unpruned_reference_at_shallow_depths() {
        let fixtures = [
            ("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", 3),
            ("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1", 3),
            // The rook ending branches widely; the unpruned reference is
            // kept to depth 2 there.
            ("k7/8/8/8/8/8/6R1/6RK w - - 0 1", 2),
        ];
        for (fen, max_depth) in fixtures {
            for depth in 1..=max_depth {
                let mut b = board(fen);
                let engine = b.turn();

                let mut ref_tables = Tables::fresh();
                let expected = reference(&mut b, depth, 0, &mut ref_tables.ctx(engine));

                let mut tables = Tables::fresh();
                let (got, _) = negamax(&mut b, -INF, INF, depth, 0, &mut tables.ctx(engine));

                assert_eq!(got, expected, "divergence at depth {depth} for {fen}");
            }
        }
    }

    /// A score inside an (alpha, beta) window is the true value; a score
    /// at or outside a bound is a valid bound on the true value.
    #[test]
    fn narrowed_windows_return_sound_bounds() {
        let fen = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
        let depth = 3;

        let mut b = board(fen);
        let mut tables = Tables::fresh();
        let (truth, _) = negamax(&mut b, -INF, INF, depth, 0, &mut tables.ctx(Color::White));

        let windows = [
            (truth - 40, truth + 40),
            (truth + 10, truth + 200),
            (truth - 200, truth - 10),
        ];
        for (alpha, beta) in windows {
            let mut tables = Tables::fresh();
            let (score, _) = negamax(&mut b, alpha, beta, depth, 0, &mut tables.ctx(Color::White));
            if score > alpha && score < beta {
                assert_eq!(score, truth, "window ({alpha}, {beta}) claimed exactness");
            } else if score <= alpha {
                assert!(truth <= alpha, "fail-low must mean the truth is below alpha");
            } else {
                assert!(truth >= beta, "fail-high must mean the truth is above beta");
            }
        }
    }

    #[test]
    fn finds_mate_in_one() {
        // Scholar's mate: Qf3xf7#.
        let mut b = board("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 2 3");
        let mut tables = Tables::fresh();
        let (score, mv) = negamax(&mut b, -INF, INF, 1, 0, &mut tables.ctx(Color::White));

        assert!(score > MATE_THRESHOLD, "mate score expected, got {score}");
        let mv = mv.expect("a best move must exist");
        assert_eq!(mv.to_uci(CastlingMode::Standard).to_string(), "f3f7");
    }

    #[test]
    fn quiescence_resolves_a_hanging_queen() {
        // White to move: QxQ on d8 wins a queen; the static score before
        // the exchange is far below the quiescence score.
        let mut b = board("3q3k/8/8/8/8/8/8/3Q3K w - - 0 1");
        let mut tables = Tables::fresh();
        let quiet = quiescence(&mut b, -INF, INF, &mut tables.ctx(Color::White));
        assert!(quiet > 800, "winning the queen should show up, got {quiet}");
    }

    #[test]
    fn quiescence_stands_pat_in_quiet_positions() {
        let mut b = board("6k1/5ppp/8/8/8/8/5PPP/6K1 w - - 0 1");
        let mut tables = Tables::fresh();
        let quiet = quiescence(&mut b, -INF, INF, &mut tables.ctx(Color::White));
        assert_eq!(quiet, evaluate(&b, Color::White));
    }

    #[test]
    fn null_move_pruning_keeps_the_mate() {
        let mut b = board("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5Q2/PPPP1PPP/RNB1K1NR w KQkq - 2 3");
        let mut tables = Tables::fresh();
        let (score, mv) = negamax(&mut b, -INF, INF, 4, 0, &mut tables.ctx(Color::White));

        assert!(score > MATE_THRESHOLD);
        let mv = mv.expect("a best move must exist");
        assert_eq!(mv.to_uci(CastlingMode::Standard).to_string(), "f3f7");
    }

    #[test]
    fn tt_entry_is_written_for_the_root() {
        let mut b = SearchBoard::new(Chess::default());
        let key = b.key();
        let mut tables = Tables::fresh();
        let (score, _) = negamax(&mut b, -INF, INF, 2, 0, &mut tables.ctx(Color::White));

        let entry = tables.tt.probe(key).expect("root entry should be stored");
        assert_eq!(entry.depth, 2);
        assert_eq!(entry.score, score);
        assert_eq!(entry.bound, Bound::Exact);
        assert!(entry.best_move.is_some());
    }

    #[test]
    fn killers_stay_quiet_only() {
        // A middlegame position with plenty of captures available.
        let mut b = board("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        let mut tables = Tables::fresh();
        let engine = Color::White;
        let _ = negamax(&mut b, -INF, INF, 3, 0, &mut tables.ctx(engine));

        for ply in 0..MAX_PLY {
            let [slot0, slot1] = tables.killers.at(ply);
            for killer in [slot0, slot1].into_iter().flatten() {
                assert!(!killer.is_capture(), "killer {killer:?} is a capture");
                assert!(!killer.is_promotion(), "killer {killer:?} is a promotion");
            }
            if let (Some(a), Some(b)) = (slot0, slot1) {
                assert_ne!(a, b, "killer slots must differ at ply {ply}");
            }
        }
    }

    #[test]
    fn stalemate_scores_zero_from_the_search() {
        // Black to move, stalemated.
        let mut b = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        let mut tables = Tables::fresh();
        let (score, mv) = negamax(&mut b, -INF, INF, 2, 0, &mut tables.ctx(Color::Black));
        assert_eq!(score, 0);
        assert!(mv.is_none());
    }
}
