pub mod cancel;
pub mod orchestrator;
