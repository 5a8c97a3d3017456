pub mod triage;

pub use triage::TriageProcessor;
