//! Move ordering for the main search and quiescence.
//!
//! The orderer buffers the legal moves once and hands them out in cutoff
//! likelihood order: transposition-table move, captures by most valuable
//! victim, killer moves, then quiet moves by history score. The searcher
//! stops pulling as soon as it cuts off, so the tail costs nothing beyond
//! the up-front sort.

use shakmaty::{Move, Role};

use crate::board::SearchBoard;
use crate::search::heuristics::HistoryTable;

/// Ordering value of the captured piece: pawn 1, knight 3, bishop 3,
/// rook 5, queen 9. En passant captures a pawn and scores 1.
///
/// There is deliberately no attacker tie-break: victims only.
pub(crate) fn victim_value(mv: &Move) -> i32 {
    match mv.capture() {
        Some(Role::Pawn) => 1,
        Some(Role::Knight) | Some(Role::Bishop) => 3,
        Some(Role::Rook) => 5,
        Some(Role::Queen) => 9,
        Some(Role::King) | None => 0,
    }
}

/// Legal moves of the current position in search order.
pub struct OrderedMoves {
    moves: Vec<Move>,
    cursor: usize,
}

impl OrderedMoves {
    /// Order the legal moves of `board`.
    ///
    /// `tt_move` (when legal here) comes first and exactly once. Captures
    /// follow, sorted by victim value; then killer slot 0 and slot 1 when
    /// they are legal quiet moves; then the remaining quiets by falling
    /// history score. Equal keys keep move-generation order.
    pub fn new(
        board: &SearchBoard,
        tt_move: Option<Move>,
        killers: [Option<Move>; 2],
        history: &HistoryTable,
    ) -> Self {
        let turn = board.turn();

        let mut front: Option<Move> = None;
        let mut captures: Vec<(i32, Move)> = Vec::new();
        let mut killer_hits: Vec<(i32, Move)> = Vec::new();
        let mut quiets: Vec<(i32, Move)> = Vec::new();

        for mv in board.legal_moves() {
            if tt_move == Some(mv) {
                front = Some(mv);
            } else if mv.is_capture() {
                captures.push((victim_value(&mv), mv));
            } else if killers[0] == Some(mv) {
                killer_hits.push((2, mv));
            } else if killers[1] == Some(mv) {
                killer_hits.push((1, mv));
            } else {
                let score = match mv.from() {
                    Some(from) => history.score(turn, from, mv.to()),
                    None => 0,
                };
                quiets.push((score, mv));
            }
        }

        captures.sort_by(|a, b| b.0.cmp(&a.0));
        killer_hits.sort_by(|a, b| b.0.cmp(&a.0));
        quiets.sort_by(|a, b| b.0.cmp(&a.0));

        let mut moves = Vec::with_capacity(
            usize::from(front.is_some()) + captures.len() + killer_hits.len() + quiets.len(),
        );
        moves.extend(front);
        moves.extend(captures.into_iter().map(|(_, mv)| mv));
        moves.extend(killer_hits.into_iter().map(|(_, mv)| mv));
        moves.extend(quiets.into_iter().map(|(_, mv)| mv));

        Self { moves, cursor: 0 }
    }
}

impl Iterator for OrderedMoves {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        let mv = self.moves.get(self.cursor).copied();
        self.cursor += 1;
        mv
    }
}

/// Captures and promotions of the current position, most valuable victim
/// first, for quiescence.
pub(crate) fn noisy_moves(board: &SearchBoard) -> Vec<Move> {
    let mut noisy: Vec<Move> = board
        .legal_moves()
        .into_iter()
        .filter(|mv| mv.is_capture() || mv.is_promotion())
        .collect();
    noisy.sort_by(|a, b| victim_value(b).cmp(&victim_value(a)));
    noisy
}
