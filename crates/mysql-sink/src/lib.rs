//! MySQL load target for the agrovida loader
//!
//! Defines the [`LoadTarget`] seam the loader writes through, the MySQL session
//! implementing it, and the SQL text the loader issues.

mod error;
mod session;
pub mod statement;
mod target;

pub use error::SinkError;
pub use session::{ConnectOpts, MySqlSession};
pub use target::LoadTarget;
