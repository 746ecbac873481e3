//! Helpers shared by the Cowatch packages: logging setup and time.

pub mod logger;
pub mod time;
