// Public API - only expose the runner module
pub mod runner;

// Internal modules - organized by pipeline stage
mod collection;
mod config;
mod formats;
mod github;
mod inference;
mod io;
mod telemetry;
