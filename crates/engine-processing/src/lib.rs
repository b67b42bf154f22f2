pub mod error;
pub mod executor;
pub mod failure_sink;
pub mod heuristic;
pub mod normalize;
pub mod retry;
