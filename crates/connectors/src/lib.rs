pub mod destination;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod provider;
pub mod source;
