#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod attendance;
pub mod constants;
pub mod credential;
pub mod error;
pub mod event;
pub mod user;
pub mod value;

pub use attendance::*;
pub use constants::*;
pub use credential::*;
pub use error::*;
pub use event::*;
pub use user::*;
pub use value::*;
