pub mod address;
pub mod batch;
pub mod failure;
