pub mod config;
pub mod error;
pub mod runner;

#[cfg(test)]
mod tests;
