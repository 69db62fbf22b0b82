//! Sequential walk over runs and artifacts producing dataset rows

pub mod collector;

pub use collector::Collector;
