use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ThreatError {
    #[error("unknown fear query purpose `{0}`")]
    UnknownPurpose(String),

    #[error("threat kind `{0}` is already registered")]
    DuplicateKind(String),
}
