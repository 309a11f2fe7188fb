mod blocks;
mod callout;
mod core;
mod edit;
mod error;
mod ops;
mod plugin;
mod position;
mod request;
mod slash;

pub use crate::blocks::*;
pub use crate::callout::*;
pub use crate::core::*;
pub use crate::error::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::position::*;
pub use crate::request::*;
pub use crate::slash::*;
