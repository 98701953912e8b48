use thiserror::Error;

use crate::remote::MatchError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TypeaheadError {
    #[error("No suggestion URL given.\n\nPass it as the first argument or set [remote] url in {0}")]
    MissingUrl(String),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
