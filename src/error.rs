/// Errors surfaced to the user by the seating chart tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No students found. Please import and save a roster first.")]
    NoStudents,
    #[error("roster \"{0}\" not found")]
    RosterNotFound(String),
    #[error("invalid roster name: {0:?}")]
    InvalidRosterName(String),
    #[error("row {0} is out of range")]
    RowOutOfRange(usize),
    #[error("column {0} is out of range")]
    ColumnOutOfRange(usize),
    #[error("column \"{0}\" does not exist")]
    UnknownColumn(String),
    #[error("column \"{0}\" already exists")]
    DuplicateColumn(String),
    #[error("column \"{0}\" is required and cannot be changed")]
    RequiredColumn(String),
    #[error("CSV file has no header row")]
    EmptyCsv,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
