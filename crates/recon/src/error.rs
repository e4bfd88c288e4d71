use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// A write or insert addressed a cell outside the document.
    OutOfRange { row: usize, column: usize },
    /// The live document rejected a call.
    Document(String),
    /// IO error (save, reopen, etc.).
    Io(String),
    /// The reconciliation session was already finished.
    SessionClosed,
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { row, column } => {
                write!(f, "cell ({row}, {column}) is outside the document")
            }
            Self::Document(msg) => write!(f, "document error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::SessionClosed => write!(f, "reconciliation session is closed"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<std::io::Error> for ReconError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
