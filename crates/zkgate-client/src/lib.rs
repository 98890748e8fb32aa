#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod api;
pub mod checkin;
pub mod credentials;
pub mod qr;
pub mod scanner;

pub use api::*;
pub use checkin::*;
pub use credentials::*;
pub use qr::*;
pub use scanner::*;
