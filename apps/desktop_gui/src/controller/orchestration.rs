//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    banner: &mut Option<String>,
) {
    let cmd_name = match cmd {
        BackendCommand::ToggleRequest => "toggle_request",
        BackendCommand::RespondToConsent { .. } => "respond_to_consent",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *banner = Some("The app is busy; please retry".to_string());
        }
        Err(TrySendError::Disconnected(_)) => {
            *banner = Some(
                "Backend worker stopped (possible startup failure); restart the app".to_string(),
            );
        }
    }
}
