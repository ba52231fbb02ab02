pub mod assignment;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod io;
pub mod lifecycle;
pub mod paths;
pub mod progress;
pub mod report;
pub mod role;
pub mod types;
pub mod worker;

pub use error::{CivicError, Result};
