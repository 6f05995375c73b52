//! Search-time position stack over the rules provider.
//!
//! [`SearchBoard`] wraps a [`shakmaty::Chess`] position in a push/pop stack
//! so that the recursive search can make and unmake moves without ever
//! leaving a position half-modified. Each pushed position caches its
//! polyglot-compatible Zobrist key, which doubles as the transposition-table
//! key and as the repetition record for draw claims.

use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Bitboard, Chess, Color, EnPassantMode, Move, MoveList, Position, Role};

/// Squares of the seventh rank (white pawns one step from promotion).
const RANK_7: Bitboard = Bitboard(0x00FF_0000_0000_0000);

/// Squares of the second rank (black pawns one step from promotion).
const RANK_2: Bitboard = Bitboard(0x0000_0000_0000_FF00);

/// 64-bit polyglot Zobrist key for a position.
///
/// The same key addresses the transposition table and the opening book, so
/// it must stay on the polyglot algorithm.
pub fn position_key(pos: &Chess) -> u64 {
    pos.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

/// A chess position together with the stack of positions that led to it.
///
/// The search owns exactly one of these per `choose_move` call. Every
/// [`push`](SearchBoard::push) must be balanced by a [`pop`](SearchBoard::pop)
/// on the same path; popping restores the previous position exactly, keys
/// included.
pub struct SearchBoard {
    stack: Vec<Chess>,
    keys: Vec<u64>,
}

impl SearchBoard {
    /// Start a search stack rooted at `pos`.
    pub fn new(pos: Chess) -> Self {
        let key = position_key(&pos);
        Self {
            stack: vec![pos],
            keys: vec![key],
        }
    }

    /// The current position (top of the stack).
    pub fn position(&self) -> &Chess {
        self.stack.last().expect("stack holds at least the root")
    }

    /// Zobrist key of the current position.
    pub fn key(&self) -> u64 {
        *self.keys.last().expect("stack holds at least the root")
    }

    /// Side to move in the current position.
    pub fn turn(&self) -> Color {
        self.position().turn()
    }

    /// Legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        self.position().legal_moves()
    }

    /// Play a legal move, making the resulting position current.
    pub fn push(&mut self, mv: Move) {
        let mut child = self.position().clone();
        child.play_unchecked(mv);
        self.keys.push(position_key(&child));
        self.stack.push(child);
    }

    /// Pass the turn without moving, for null-move pruning.
    ///
    /// Returns `false` (leaving the stack untouched) when the side to move
    /// is in check and the turn cannot be handed over.
    pub fn push_null(&mut self) -> bool {
        match self.position().clone().swap_turn() {
            Ok(child) => {
                self.keys.push(position_key(&child));
                self.stack.push(child);
                true
            }
            Err(_) => false,
        }
    }

    /// Undo the most recent [`push`](Self::push) or successful
    /// [`push_null`](Self::push_null).
    pub fn pop(&mut self) {
        debug_assert!(self.stack.len() > 1, "pop without matching push");
        self.stack.pop();
        self.keys.pop();
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.position().is_check()
    }

    /// Whether the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.position().is_checkmate()
    }

    /// Whether the side to move has no legal move but is not in check.
    pub fn is_stalemate(&self) -> bool {
        self.position().is_stalemate()
    }

    /// Whether neither side retains mating material.
    pub fn is_insufficient_material(&self) -> bool {
        self.position().is_insufficient_material()
    }

    /// Halfmove clock of the current position (plies since the last capture
    /// or pawn move).
    pub fn halfmoves(&self) -> u32 {
        self.position().halfmoves()
    }

    /// Whether the game has ended at the current position.
    ///
    /// Covers checkmate, stalemate and insufficient material, plus the
    /// automatic seventy-five-move and fivefold-repetition terminations.
    /// Repetitions are counted within this search stack; the caller hands
    /// over a bare position, not the game record.
    pub fn is_game_over(&self) -> bool {
        self.position().is_game_over() || self.halfmoves() >= 150 || self.repetitions() >= 5
    }

    /// Whether the side to move could claim a draw here.
    ///
    /// True once the fifty-move counter is full or the current position has
    /// occurred three times on this stack (the current occurrence included).
    pub fn can_claim_draw(&self) -> bool {
        self.halfmoves() >= 100 || self.repetitions() >= 3
    }

    /// Pawns of the side to move standing one step from promotion.
    pub fn promotion_candidates(&self) -> Bitboard {
        let pawns = self.position().our(Role::Pawn);
        match self.turn() {
            Color::White => pawns & RANK_7,
            Color::Black => pawns & RANK_2,
        }
    }

    /// Occurrences of the current position in the stack, itself included.
    fn repetitions(&self) -> usize {
        let key = self.key();
        self.keys.iter().filter(|&&k| k == key).count()
    }
}
