//! Static evaluation: tapered PeSTO material and piece-square scoring with
//! a passed-pawn term.
//!
//! [`evaluate`] returns centipawns from the engine's perspective (positive
//! means the engine stands better), which is what the search's stand-pat
//! and terminal handling expect.

pub mod pawns;
pub mod phase;
pub mod pst;
pub mod score;

use shakmaty::{Color, Position, Role};

use crate::board::SearchBoard;
use pawns::{is_passed, passed_bonus};
use phase::{MAX_PHASE, game_phase};
use pst::{MATERIAL, pst_value, role_index};
use score::Score;

/// Magnitude of a forced-mate score. Finite so negation and ply adjustment
/// stay well inside `i32`.
pub const MATE_SCORE: i32 = 99_999_999;

/// Score `board` in centipawns from the perspective of `engine`.
///
/// Terminal positions short-circuit: a checkmate is catastrophic for the
/// side to move (so `-MATE_SCORE` when that side is the engine), and any
/// drawn or claimable-draw position scores zero. Otherwise material,
/// piece-square and passed-pawn terms are accumulated as packed
/// midgame/endgame pairs and blended by the phase weight.
pub fn evaluate(board: &SearchBoard, engine: Color) -> i32 {
    if board.is_checkmate() {
        return if board.turn() == engine {
            -MATE_SCORE
        } else {
            MATE_SCORE
        };
    }

    if board.is_stalemate() || board.is_insufficient_material() || board.can_claim_draw() {
        return 0;
    }

    let pieces = board.position().board();
    let phase = game_phase(pieces);

    let white_pawns = pieces.pawns() & pieces.white();
    let black_pawns = pieces.pawns() & pieces.black();

    let mut score = Score::ZERO;
    for sq in pieces.occupied() {
        let Some(piece) = pieces.piece_at(sq) else {
            continue;
        };

        let value = MATERIAL[role_index(piece.role)] + pst_value(piece.role, piece.color, sq);
        match piece.color {
            Color::White => score += value,
            Color::Black => score -= value,
        }

        if piece.role == Role::Pawn {
            match piece.color {
                Color::White => {
                    if is_passed(Color::White, sq, black_pawns) {
                        score += passed_bonus(Color::White, sq);
                    }
                }
                Color::Black => {
                    if is_passed(Color::Black, sq, white_pawns) {
                        score -= passed_bonus(Color::Black, sq);
                    }
                }
            }
        }
    }

    let blended = blend(score, phase);
    if engine == Color::White { blended } else { -blended }
}

/// Interpolate a packed score by phase: `MAX_PHASE` selects the midgame
/// half, 0 the endgame half, with integer division in between.
pub(crate) fn blend(score: Score, phase: i32) -> i32 {
    (i32::from(score.mg()) * phase + i32::from(score.eg()) * (MAX_PHASE - phase)) / MAX_PHASE
}
