use std::sync::Arc;

use crate::{document::DocumentAnalyzer, resume::ResumeUpdater};

/// Shared handler state. Clients are optional so the server can start with
/// only part of the vendor configuration present.
#[derive(Clone, Default)]
pub struct AppState {
    pub updater: Option<Arc<ResumeUpdater>>,
    pub analyzer: Option<Arc<dyn DocumentAnalyzer>>,
}
