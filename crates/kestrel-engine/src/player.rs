//! Player facade: the outward move-selection surface.
//!
//! Two interchangeable players sit behind the small capability
//! `{ color, choose_move }`: the [`SearchPlayer`] (opening book, then
//! iterative-deepening search) and the baseline [`RandomPlayer`]. The
//! [`Player`] enum dispatches between them.

use std::path::PathBuf;
use std::time::Duration;

use rand::seq::SliceRandom;
use shakmaty::{Chess, Color, Move, Position};
use tracing::{debug, warn};

use crate::board::SearchBoard;
use crate::book::Book;
use crate::error::PlayerError;
use crate::search::Searcher;

/// Lazily opened opening book.
///
/// The book file is read on the first move selection. A failed load is
/// logged and never retried; the player simply searches from then on.
enum BookState {
    Unopened(PathBuf),
    Loaded(Book),
    Unavailable,
}

/// Move selection by opening book and iterative-deepening search.
pub struct SearchPlayer {
    color: Color,
    depth_limit: u32,
    time_limit: Duration,
    book: BookState,
    /// Endgame tablebase location. Accepted for configuration parity but
    /// never probed.
    tablebase_path: Option<PathBuf>,
    searcher: Searcher,
}

impl SearchPlayer {
    /// Create a search player.
    ///
    /// `depth_limit` is an exclusive bound on the iterative-deepening
    /// depth: depths `1..depth_limit` are searched, so a limit of 1 runs
    /// no search at all. `time_limit` is the soft wall-clock budget per
    /// move. `book_path` names an optional polyglot book consulted before
    /// searching; `tablebase_path` is accepted but unused.
    pub fn new(
        color: Color,
        depth_limit: u32,
        time_limit: Duration,
        book_path: Option<PathBuf>,
        tablebase_path: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = &tablebase_path {
            debug!(path = %path.display(), "tablebase path configured but probing is disabled");
        }
        Self {
            color,
            depth_limit,
            time_limit,
            book: match book_path {
                Some(path) => BookState::Unopened(path),
                None => BookState::Unavailable,
            },
            tablebase_path,
            searcher: Searcher::new(),
        }
    }

    /// The side this player plays.
    pub fn color(&self) -> Color {
        self.color
    }

    /// The configured (unused) tablebase location.
    pub fn tablebase_path(&self) -> Option<&PathBuf> {
        self.tablebase_path.as_ref()
    }

    /// Choose a move for `pos`: a book move when the position is in the
    /// book, otherwise the best move of the deepest completed search
    /// iteration.
    pub fn choose_move(&mut self, pos: &Chess) -> Result<Move, PlayerError> {
        if let Some(mv) = self.book_move(pos) {
            debug!(mv = %mv.to_uci(shakmaty::CastlingMode::Standard), "book move");
            return Ok(mv);
        }

        let mut board = SearchBoard::new(pos.clone());
        let result = self
            .searcher
            .search(&mut board, self.color, self.depth_limit, self.time_limit);
        result.best_move.ok_or(PlayerError::NoMove)
    }

    fn book_move(&mut self, pos: &Chess) -> Option<Move> {
        if let BookState::Unopened(path) = &self.book {
            let path = path.clone();
            self.book = match Book::open(&path) {
                Ok(book) => {
                    debug!(entries = book.len(), "opening book loaded");
                    BookState::Loaded(book)
                }
                Err(err) => {
                    warn!(error = %err, "opening book unavailable, searching instead");
                    BookState::Unavailable
                }
            };
        }

        match &self.book {
            BookState::Loaded(book) => book.pick(pos),
            _ => None,
        }
    }
}

/// Baseline player: a uniformly random legal move.
pub struct RandomPlayer {
    color: Color,
}

impl RandomPlayer {
    /// Create a random player for `color`.
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    /// The side this player plays.
    pub fn color(&self) -> Color {
        self.color
    }

    /// A uniformly random legal move.
    pub fn choose_move(&self, pos: &Chess) -> Result<Move, PlayerError> {
        pos.legal_moves()
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or(PlayerError::NoMove)
    }
}

/// A move-selecting player of either variant.
pub enum Player {
    /// Book-and-search player.
    Search(SearchPlayer),
    /// Uniform-random baseline.
    Random(RandomPlayer),
}

impl Player {
    /// Create a search player; see [`SearchPlayer::new`].
    pub fn search(
        color: Color,
        depth_limit: u32,
        time_limit: Duration,
        book_path: Option<PathBuf>,
        tablebase_path: Option<PathBuf>,
    ) -> Self {
        Player::Search(SearchPlayer::new(
            color,
            depth_limit,
            time_limit,
            book_path,
            tablebase_path,
        ))
    }

    /// Create a random player.
    pub fn random(color: Color) -> Self {
        Player::Random(RandomPlayer::new(color))
    }

    /// The side this player plays.
    pub fn color(&self) -> Color {
        match self {
            Player::Search(player) => player.color(),
            Player::Random(player) => player.color(),
        }
    }

    /// Choose a move for `pos`.
    pub fn choose_move(&mut self, pos: &Chess) -> Result<Move, PlayerError> {
        match self {
            Player::Search(player) => player.choose_move(pos),
            Player::Random(player) => player.choose_move(pos),
        }
    }
}
