// Core library for the fuzzy MDM configuration front-end

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod schedule;
pub mod state;
pub mod telemetry;
pub mod validation;
