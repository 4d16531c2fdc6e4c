use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("behavior state constructed without an owning agent")]
    MissingAgent,
}
