use crate::db::indices::{InstId, MasterId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("unknown master {0:?}")]
    UnknownMaster(MasterId),

    #[error("instance '{0}' already exists")]
    DuplicateInstance(String),

    #[error("instance {0:?} no longer exists")]
    StaleInstance(InstId),
}
