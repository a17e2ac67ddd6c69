use crate::model::MarkerId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is not supported yet")]
    Unsupported(&'static str),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("marker id {0} appears more than once")]
    DuplicateId(MarkerId),

    #[error("marker id {0} is out of range")]
    InvalidId(MarkerId),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
