pub mod blockage;
pub mod boundary;
pub mod cut;
pub mod error;
pub mod fills;
pub mod insert;
pub mod options;
pub mod rows;
pub mod session;

pub use cut::CutSummary;
pub use error::{Result, TapcellError};
pub use fills::{FilledSite, RowFills};
pub use options::{Options, Role};
pub use session::{RunSummary, Tapcell};
