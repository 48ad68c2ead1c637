pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod source;

pub use error::RelarcError;
