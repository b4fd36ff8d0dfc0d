//! Backend -> UI events.

use location_core::RequestSnapshot;

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// New orchestrator state to render.
    SnapshotUpdated(RequestSnapshot),
    /// Location use is denied or restricted; present the modal alert.
    PermissionDenied,
    /// The permission service wants the user asked for consent.
    ConsentPromptRequested,
    /// The worker hit a startup or plumbing failure.
    BackendFailed(String),
}
