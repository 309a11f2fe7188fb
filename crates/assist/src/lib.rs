mod config;
mod error;
mod families;
mod manager;
mod rules;
mod session;
mod wire;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::families::*;
pub use crate::manager::*;
pub use crate::rules::*;
pub use crate::session::*;
pub use crate::wire::*;
