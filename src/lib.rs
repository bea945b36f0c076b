pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod exchange;
pub mod journal;
pub mod logging;
pub mod orders;
pub mod sign;
pub mod validators;

#[cfg(test)]
mod tests;
