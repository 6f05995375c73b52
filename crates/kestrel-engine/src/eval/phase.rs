//! Game phase from remaining non-pawn material.

use shakmaty::Board;

/// Phase weight of a full middlegame material set.
///
/// Weights: Knight = 1, Bishop = 1, Rook = 2, Queen = 4, summed over both
/// colors. Starting totals: 4×1 + 4×1 + 4×2 + 2×4 = 24.
pub const MAX_PHASE: i32 = 24;

/// Phase weight of the position, clamped to `0..=MAX_PHASE`.
///
/// [`MAX_PHASE`] means full middlegame material; 0 a pure pawn ending.
/// The clamp keeps promoted pieces from pushing past the maximum.
pub fn game_phase(board: &Board) -> i32 {
    let knights = board.knights().count() as i32;
    let bishops = board.bishops().count() as i32;
    let rooks = board.rooks().count() as i32;
    let queens = board.queens().count() as i32;

    let phase = knights + bishops + rooks * 2 + queens * 4;
    phase.min(MAX_PHASE)
}
