pub mod config;
pub mod error;
pub mod keyfile;

pub use error::{KinsealError, KinsealResult};
