use thiserror::Error;

/// Failure to produce a snapshot of the source relations. Fatal to the
/// current operation; surfaced to the caller and never retried internally.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("required relation `{0}` is missing")]
    MissingRelation(String),
}

/// Failure of the mail transport. Fatal for a health check or a single
/// send; inside a batch it is absorbed per recipient and never aborts the
/// remaining sends.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("mail transport configuration invalid: {0}")]
    Configuration(String),
    #[error("invalid recipient address `{0}`")]
    InvalidAddress(String),
    #[error("mail transport failure: {0}")]
    Transport(String),
}

/// Top-level error surface of the engine's public operations.
///
/// Per-row data-quality problems (unparseable birth dates, non-numeric
/// amounts) are deliberately not represented here: they are absorbed with
/// safe defaults at the point of use.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Mail(#[from] MailError),
}
