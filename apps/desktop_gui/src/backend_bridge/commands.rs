//! UI -> backend command set.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCommand {
    /// User tapped the find-location control.
    ToggleRequest,
    /// User answered the consent prompt.
    RespondToConsent { granted: bool },
}
