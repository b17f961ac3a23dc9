use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Invalid sentinel policy: {0}")]
    InvalidPolicy(String),
}
