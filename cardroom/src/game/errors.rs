//! Errors surfaced by the engine and the table layer.

use thiserror::Error;

/// Every failure a caller can observe. Validation errors never mutate state;
/// the internal kinds (`DeckExhausted`, `InsufficientCards`, `Internal`)
/// indicate a bug and quarantine the table they occurred on.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GameError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("table is full")]
    TableFull,
    #[error("already seated at this table")]
    AlreadySeated,
    #[error("not seated at this table")]
    NotSeated,
    #[error("not your turn to act")]
    NotYourTurn,
    #[error("game is not in progress")]
    GameNotInProgress,
    #[error("game has already started")]
    GameAlreadyStarted,
    #[error("cannot leave while active in a hand")]
    CannotLeaveWhileActive,
    #[error("already cashed out")]
    AlreadyCashedOut,
    #[error("deck exhausted: asked for {requested}, {remaining} left")]
    DeckExhausted { requested: usize, remaining: usize },
    #[error("not enough cards to evaluate a hand")]
    InsufficientCards,
    #[error("table is busy, try again")]
    Busy,
    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Stable machine-readable kind, used as the `error` field of command
    /// responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "NotFound",
            Self::InvalidAction(_) => "InvalidAction",
            Self::InvalidAmount(_) => "InvalidAmount",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::TableFull => "TableFull",
            Self::AlreadySeated => "AlreadySeated",
            Self::NotSeated => "NotSeated",
            Self::NotYourTurn => "NotYourTurn",
            Self::GameNotInProgress => "GameNotInProgress",
            Self::GameAlreadyStarted => "GameAlreadyStarted",
            Self::CannotLeaveWhileActive => "CannotLeaveWhileActive",
            Self::AlreadyCashedOut => "AlreadyCashedOut",
            Self::DeckExhausted { .. } => "DeckExhausted",
            Self::InsufficientCards => "InsufficientCards",
            Self::Busy => "Busy",
            Self::Internal(_) => "Internal",
        }
    }

    /// True for the kinds that indicate an engine bug rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::DeckExhausted { .. } | Self::InsufficientCards | Self::Internal(_)
        )
    }
}

impl From<sqlx::Error> for GameError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
