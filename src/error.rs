use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Errors crossing the command boundary, tagged by kind so the frontend can
/// distinguish "sold out" from "closed" from a caller mistake.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("bake slot not found")]
    SlotNotFound,

    #[error("bake slot is closed for new orders")]
    SlotClosed,

    #[error("not enough capacity left in this bake slot ({remaining} remaining)")]
    CapacityExceeded { remaining: i64 },

    #[error("prep sheet is not in draft state")]
    SheetNotDraft,

    #[error("order is not eligible for this prep sheet: {0}")]
    OrderNotEligible(String),

    #[error("a draft prep sheet already exists for this bake date")]
    DuplicateActiveSheet,

    #[error("prep sheet has no items")]
    EmptySheet,

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("storage is temporarily unavailable, try again")]
    SyncUnavailable,

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::SlotNotFound => "slot_not_found",
            AppError::SlotClosed => "slot_closed",
            AppError::CapacityExceeded { .. } => "capacity_exceeded",
            AppError::SheetNotDraft => "sheet_not_draft",
            AppError::OrderNotEligible(_) => "order_not_eligible",
            AppError::DuplicateActiveSheet => "duplicate_active_sheet",
            AppError::EmptySheet => "empty_sheet",
            AppError::InvalidQuantity(_) => "invalid_quantity",
            AppError::InvalidSplit(_) => "invalid_split",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::SyncUnavailable => "sync_unavailable",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

// Busy/locked means another writer holds the file; the caller may retry.
// Everything else is a real storage fault.
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi::ErrorCode;
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == ErrorCode::DatabaseBusy || e.code == ErrorCode::DatabaseLocked =>
            {
                AppError::SyncUnavailable
            }
            _ => AppError::Database(err),
        }
    }
}

// Tauri commands require serializable errors; emit {kind, message} so the
// frontend branches on kind and shows message verbatim.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("AppError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

pub type AppResult<T> = Result<T, AppError>;
