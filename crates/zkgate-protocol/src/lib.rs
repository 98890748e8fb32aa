#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod babyzk;
pub mod backend;
pub mod context;
pub mod credential;
pub mod generator;
pub mod issuer;
pub mod proof;
pub mod query;
pub mod verifier;

pub use babyzk::*;
pub use backend::*;
pub use context::*;
pub use credential::*;
pub use generator::*;
pub use issuer::*;
pub use proof::*;
pub use query::*;
pub use verifier::*;
