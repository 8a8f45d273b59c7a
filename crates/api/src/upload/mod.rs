//! Upload pipeline orchestration.

pub mod orchestrator;

pub use orchestrator::{verify_callback_url, IntakeReceipt, UploadOrchestrator};
