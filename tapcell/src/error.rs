use crate::options::Role;
use tap_common::db::DbError;
use tap_common::db::core::Orient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TapcellError {
    #[error("no master configured for {0}")]
    MissingMaster(Role),

    #[error("master '{master}' ({role}) cannot be placed in orientation {orient}")]
    Symmetry {
        role: Role,
        master: String,
        orient: Orient,
    },

    #[error("unknown master '{name}' given for {role}")]
    UnknownMaster { role: Role, name: String },

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, TapcellError>;
