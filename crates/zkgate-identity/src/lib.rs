#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod identity;
pub mod session;

pub use identity::*;
pub use session::*;
