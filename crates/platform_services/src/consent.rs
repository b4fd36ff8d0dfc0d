//! File-backed location consent: the desktop analog of a platform
//! permission store.

use std::{
    fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use location_core::services::PermissionService;
use shared::domain::PermissionStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedConsent {
    status: PermissionStatus,
}

/// Authorization state persisted as a small JSON document. The prompt is
/// out-of-band: `request_authorization` notifies subscribers, the display
/// layer asks the user, and `record_decision` stores the answer.
pub struct ConsentFilePermissionService {
    path: PathBuf,
    status: Mutex<PermissionStatus>,
    prompts: broadcast::Sender<()>,
}

impl ConsentFilePermissionService {
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let status = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<PersistedConsent>(&raw) {
                Ok(persisted) => persisted.status,
                Err(err) => {
                    warn!(
                        "ignoring malformed consent file '{}': {err}",
                        path.display()
                    );
                    PermissionStatus::NotDetermined
                }
            },
            Err(_) => PermissionStatus::NotDetermined,
        };
        let (prompts, _) = broadcast::channel(4);
        Self {
            path,
            status: Mutex::new(status),
            prompts,
        }
    }

    /// Prompt notifications for the display layer.
    pub fn subscribe_prompts(&self) -> broadcast::Receiver<()> {
        self.prompts.subscribe()
    }

    /// Stores the user's answer to the consent prompt.
    pub fn record_decision(&self, granted: bool) -> Result<()> {
        let status = if granted {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
        self.persist(status)?;
        *self.lock_status() = status;
        debug!(?status, "recorded consent decision");
        Ok(())
    }

    fn persist(&self, status: PermissionStatus) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create consent directory '{}'",
                    parent.display()
                )
            })?;
        }
        let body = serde_json::to_string_pretty(&PersistedConsent { status })?;
        fs::write(&self.path, body).with_context(|| {
            format!("failed to write consent file '{}'", self.path.display())
        })?;
        Ok(())
    }

    fn lock_status(&self) -> MutexGuard<'_, PermissionStatus> {
        match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl PermissionService for ConsentFilePermissionService {
    fn authorization_status(&self) -> PermissionStatus {
        *self.lock_status()
    }

    async fn request_authorization(&self) -> Result<()> {
        let current = *self.lock_status();
        if current != PermissionStatus::NotDetermined {
            debug!(?current, "consent prompt skipped; status already decided");
            return Ok(());
        }
        if self.prompts.send(()).is_err() {
            warn!("no consent prompt listener registered");
        }
        Ok(())
    }
}

/// Fixed authorization state, for headless runs and tests.
pub struct StaticPermissionService {
    status: PermissionStatus,
}

impl StaticPermissionService {
    pub fn new(status: PermissionStatus) -> Self {
        Self { status }
    }
}

#[async_trait]
impl PermissionService for StaticPermissionService {
    fn authorization_status(&self) -> PermissionStatus {
        self.status
    }

    async fn request_authorization(&self) -> Result<()> {
        debug!("static permission service ignores authorization requests");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_consent_path() -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        env::temp_dir()
            .join(format!("geofix_consent_test_{suffix}"))
            .join("consent.json")
    }

    #[test]
    fn starts_undetermined_without_a_file() {
        let service = ConsentFilePermissionService::load_or_default(temp_consent_path());
        assert_eq!(
            service.authorization_status(),
            PermissionStatus::NotDetermined
        );
    }

    #[test]
    fn decisions_persist_across_reload() {
        let path = temp_consent_path();
        let service = ConsentFilePermissionService::load_or_default(path.clone());
        service.record_decision(true).expect("record decision");
        assert_eq!(service.authorization_status(), PermissionStatus::Granted);

        let reloaded = ConsentFilePermissionService::load_or_default(path.clone());
        assert_eq!(reloaded.authorization_status(), PermissionStatus::Granted);

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[tokio::test]
    async fn prompt_reaches_subscribers_only_while_undetermined() {
        let path = temp_consent_path();
        let service = ConsentFilePermissionService::load_or_default(path.clone());
        let mut prompts = service.subscribe_prompts();

        service.request_authorization().await.expect("request");
        assert!(prompts.try_recv().is_ok());

        service.record_decision(false).expect("record decision");
        service.request_authorization().await.expect("request");
        assert!(prompts.try_recv().is_err());

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }

    #[test]
    fn malformed_file_falls_back_to_undetermined() {
        let path = temp_consent_path();
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "not json").expect("write");

        let service = ConsentFilePermissionService::load_or_default(path.clone());
        assert_eq!(
            service.authorization_status(),
            PermissionStatus::NotDetermined
        );

        fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
    }
}
