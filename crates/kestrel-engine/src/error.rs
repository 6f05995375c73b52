//! Error types for the opening book and the player facade.

/// Errors that can occur while loading a polyglot opening book.
///
/// Book problems are configuration errors: callers log them and continue
/// without a book rather than failing the move selection.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// The book file could not be read.
    #[error("failed to read opening book: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The file length is not a whole number of 16-byte entries.
    #[error("opening book is truncated: {length} bytes is not a multiple of 16")]
    Truncated {
        /// Length of the file in bytes.
        length: usize,
    },
}

/// The single outward failure of a player: no move to return.
///
/// With a sound rules provider this only happens on terminal positions, or
/// when a search player is configured with a `depth_limit` of 1 (the limit
/// is exclusive, so no iteration runs).
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No move could be produced for the given position.
    #[error("no move to return for this position")]
    NoMove,
}
