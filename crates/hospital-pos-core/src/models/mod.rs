//! Domain models for the hospital POS.

mod bill;
mod config;
mod service;
mod transaction;
mod user;

pub use bill::*;
pub use config::*;
pub use service::*;
pub use transaction::*;
pub use user::*;
