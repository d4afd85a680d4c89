pub mod app;
pub mod config;
pub mod email;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::AppError;
