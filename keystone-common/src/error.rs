use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Unknown consensus strategy: {0}")]
    InvalidStrategy(String),

    #[error("Malformed vote: {0}")]
    MalformedVote(String),

    #[error("Late vote from {validator_id} on closed submission {submission_id}")]
    LateVote {
        submission_id: String,
        validator_id: String,
    },

    #[error("Unknown submission: {0}")]
    UnknownSubmission(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
