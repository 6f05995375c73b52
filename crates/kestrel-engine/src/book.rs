//! Polyglot opening book.
//!
//! A polyglot `.bin` book is a sequence of 16-byte big-endian entries
//! sorted by position key: `(key: u64, move: u16, weight: u16, learn:
//! u32)`. The position key is the same polyglot Zobrist hash the search
//! uses, so a book probe is a binary search over the loaded entries.

use std::fs;
use std::path::Path;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use shakmaty::{Chess, File, Move, Position, Rank, Role, Square};

use crate::board::position_key;
use crate::error::BookError;

/// Bytes per book entry on disk.
const ENTRY_SIZE: usize = 16;

/// One decoded book entry. The learn field is ignored.
#[derive(Debug, Clone, Copy)]
struct BookEntry {
    key: u64,
    raw_move: u16,
    weight: u16,
}

/// An opening book held in memory.
///
/// Loading reads the whole file once; every later probe is a lookup on the
/// sorted entry vector.
pub struct Book {
    entries: Vec<BookEntry>,
}

impl Book {
    /// Load a book from a polyglot `.bin` file.
    pub fn open(path: &Path) -> Result<Book, BookError> {
        let bytes = fs::read(path)?;
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(BookError::Truncated { length: bytes.len() });
        }

        let mut entries = Vec::with_capacity(bytes.len() / ENTRY_SIZE);
        for chunk in bytes.chunks_exact(ENTRY_SIZE) {
            entries.push(BookEntry {
                key: u64::from_be_bytes(chunk[0..8].try_into().expect("chunk is 16 bytes")),
                raw_move: u16::from_be_bytes(chunk[8..10].try_into().expect("chunk is 16 bytes")),
                weight: u16::from_be_bytes(chunk[10..12].try_into().expect("chunk is 16 bytes")),
            });
        }

        // The lookup requires key order; files are normally sorted on
        // disk, but hand-built ones may not be.
        entries.sort_by_key(|entry| entry.key);

        Ok(Book { entries })
    }

    /// Number of entries in the book.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the book holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick a book move for `pos`, weighted-random over the entry weights.
    ///
    /// Returns `None` when the position is not in the book or none of its
    /// entries decode to a legal move. When every weight is zero the
    /// choice is uniform.
    pub fn pick(&self, pos: &Chess) -> Option<Move> {
        let candidates: Vec<(Move, u16)> = self
            .entries_for(position_key(pos))
            .iter()
            .filter_map(|entry| decode_move(pos, entry.raw_move).map(|mv| (mv, entry.weight)))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let mut rng = rand::thread_rng();
        let index = match WeightedIndex::new(candidates.iter().map(|(_, weight)| *weight as u32)) {
            Ok(dist) => dist.sample(&mut rng),
            // All-zero weights: fall back to a uniform choice.
            Err(_) => rng.gen_range(0..candidates.len()),
        };
        Some(candidates[index].0)
    }

    /// The contiguous run of entries stored under `key`.
    fn entries_for(&self, key: u64) -> &[BookEntry] {
        let start = self.entries.partition_point(|entry| entry.key < key);
        let len = self.entries[start..].partition_point(|entry| entry.key == key);
        &self.entries[start..start + len]
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book").field("entries", &self.entries.len()).finish()
    }
}

/// Decode a polyglot 16-bit move against the legal moves of `pos`.
///
/// Bit layout: to-file 0-2, to-rank 3-5, from-file 6-8, from-rank 9-11,
/// promotion 12-14 (0 none, then knight, bishop, rook, queen). Castling is
/// encoded as the king capturing its own rook.
fn decode_move(pos: &Chess, raw: u16) -> Option<Move> {
    let to_file = File::new(u32::from(raw) & 7);
    let to_rank = Rank::new((u32::from(raw) >> 3) & 7);
    let from_file = File::new((u32::from(raw) >> 6) & 7);
    let from_rank = Rank::new((u32::from(raw) >> 9) & 7);
    let from = Square::from_coords(from_file, from_rank);
    let to = Square::from_coords(to_file, to_rank);

    let promotion = match (raw >> 12) & 7 {
        0 => None,
        1 => Some(Role::Knight),
        2 => Some(Role::Bishop),
        3 => Some(Role::Rook),
        4 => Some(Role::Queen),
        _ => return None,
    };

    pos.legal_moves().into_iter().find(|mv| match *mv {
        Move::Castle { king, rook } => promotion.is_none() && king == from && rook == to,
        _ => mv.from() == Some(from) && mv.to() == to && mv.promotion() == promotion,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use shakmaty::CastlingMode;
    use shakmaty::fen::Fen;

    use super::*;

    fn parse(fen: &str) -> Chess {
        fen.parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap()
    }

    /// Encode a move in the polyglot bit layout.
    fn encode(from: Square, to: Square, promotion: u16) -> u16 {
        let to_bits = u32::from(to.file()) | (u32::from(to.rank()) << 3);
        let from_bits = (u32::from(from.file()) << 6) | (u32::from(from.rank()) << 9);
        (to_bits | from_bits) as u16 | (promotion << 12)
    }

    fn entry_bytes(key: u64, raw_move: u16, weight: u16) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&key.to_be_bytes());
        bytes[8..10].copy_from_slice(&raw_move.to_be_bytes());
        bytes[10..12].copy_from_slice(&weight.to_be_bytes());
        bytes
    }

    fn write_book(entries: &[[u8; 16]]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for entry in entries {
            file.write_all(entry).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Book::open(Path::new("/nonexistent/book.bin")).unwrap_err();
        assert!(matches!(err, BookError::Io { .. }));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 20]).unwrap();
        file.flush().unwrap();

        let err = Book::open(file.path()).unwrap_err();
        assert!(matches!(err, BookError::Truncated { length: 20 }));
    }

    #[test]
    fn picks_the_only_entry_for_the_position() {
        let pos = Chess::default();
        let raw = encode(Square::E2, Square::E4, 0);
        let file = write_book(&[entry_bytes(position_key(&pos), raw, 10)]);

        let book = Book::open(file.path()).unwrap();
        assert_eq!(book.len(), 1);

        let mv = book.pick(&pos).expect("book move expected");
        assert_eq!(mv.from(), Some(Square::E2));
        assert_eq!(mv.to(), Square::E4);
    }

    #[test]
    fn unknown_position_yields_no_move() {
        let pos = Chess::default();
        let raw = encode(Square::E2, Square::E4, 0);
        let file = write_book(&[entry_bytes(0x1234, raw, 10)]);

        let book = Book::open(file.path()).unwrap();
        assert!(book.pick(&pos).is_none());
    }

    #[test]
    fn illegal_entries_are_filtered_out() {
        let pos = Chess::default();
        // e2e5 is never legal from the start position.
        let raw = encode(Square::E2, Square::E5, 0);
        let file = write_book(&[entry_bytes(position_key(&pos), raw, 10)]);

        let book = Book::open(file.path()).unwrap();
        assert!(book.pick(&pos).is_none());
    }

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let pos = Chess::default();
        let key = position_key(&pos);
        let file = write_book(&[
            entry_bytes(key, encode(Square::E2, Square::E4, 0), 0),
            entry_bytes(key, encode(Square::D2, Square::D4, 0), 0),
        ]);

        let book = Book::open(file.path()).unwrap();
        let mv = book.pick(&pos).expect("uniform fallback should pick");
        assert!(mv.to() == Square::E4 || mv.to() == Square::D4);
    }

    #[test]
    fn castling_is_decoded_from_king_takes_rook() {
        // White to move with short castling available.
        let pos = parse("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let raw = encode(Square::E1, Square::H1, 0);
        let file = write_book(&[entry_bytes(position_key(&pos), raw, 1)]);

        let book = Book::open(file.path()).unwrap();
        let mv = book.pick(&pos).expect("castling move expected");
        assert!(mv.is_castle());
    }

    #[test]
    fn promotions_carry_their_piece() {
        let pos = parse("8/6P1/8/8/8/8/1k6/4K3 w - - 0 1");
        let raw = encode(Square::G7, Square::G8, 4); // queen
        let file = write_book(&[entry_bytes(position_key(&pos), raw, 1)]);

        let book = Book::open(file.path()).unwrap();
        let mv = book.pick(&pos).expect("promotion move expected");
        assert_eq!(mv.promotion(), Some(Role::Queen));
    }

    #[test]
    fn weighted_choice_prefers_heavy_entries() {
        let pos = Chess::default();
        let key = position_key(&pos);
        let file = write_book(&[
            entry_bytes(key, encode(Square::E2, Square::E4, 0), u16::MAX),
            entry_bytes(key, encode(Square::A2, Square::A3, 0), 0),
        ]);

        let book = Book::open(file.path()).unwrap();
        // With weights MAX vs 0, the heavy move must always be chosen.
        for _ in 0..20 {
            let mv = book.pick(&pos).unwrap();
            assert_eq!(mv.to(), Square::E4);
        }
    }
}
