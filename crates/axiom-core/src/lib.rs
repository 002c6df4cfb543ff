pub mod clock;
pub mod config;
pub mod context;
pub mod execution;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod registry;
