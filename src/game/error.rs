//! Error types for game module
//!
//! Provides custom error types for game logic including move validation,
//! position loading, and remote/local state reconciliation.

/// Errors that can occur in game logic
#[derive(Debug, Clone, thiserror::Error)]
pub enum GameError {
    /// Move rejected by the rules engine
    #[error("Illegal move: {uci}")]
    IllegalMove { uci: String },

    /// Move text that is not coordinate notation
    #[error("Unparseable move notation: {notation}")]
    InvalidNotation { notation: String },

    /// Square text outside a1..h8
    #[error("Invalid square: {square}")]
    InvalidSquare { square: String },

    /// Starting position could not be loaded
    #[error("Invalid FEN '{fen}': {message}")]
    InvalidFen { fen: String, message: String },

    /// Remote service reported a move the local rules engine rejects
    #[error("Remote move {uci} rejected locally: {message}")]
    RemoteMoveRejected { uci: String, message: String },

    /// Engine produced a move kind that has no physical meaning on this board
    #[error("Unsupported move: {message}")]
    UnsupportedMove { message: String },
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
