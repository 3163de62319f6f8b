// Orchestrator module: sequences collaborator calls and reconciles their
// results into the configuration state

pub mod engine;
pub mod event;

pub use engine::Orchestrator;
pub use event::{Completion, RemovalOrigin, SelectionTag, UiEvent};
