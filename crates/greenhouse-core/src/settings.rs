//! Threshold configuration load/save.
//!
//! The [`SettingsSync`] reconciles locally edited threshold
//! configurations with the backend. Saving validates the required
//! field set locally first, so nothing incomplete is ever sent, and on
//! success announces [`AppEvent::SettingsSaved`] so the live data
//! coordinator re-evaluates against the new bounds. What happens next
//! in the UI (close an overlay editor, navigate home) is the caller's
//! choice; the engine does not hardcode either.

use std::sync::Arc;

use tracing::info;

use greenhouse_types::ThresholdConfig;

use crate::api::SensorApi;
use crate::error::{Error, Result};
use crate::events::{AppEvent, EventDispatcher, FaultContext};
use crate::session::SessionStore;

/// Loads and saves the active threshold configuration.
pub struct SettingsSync {
    api: Arc<dyn SensorApi>,
    session: Arc<SessionStore>,
    events: EventDispatcher,
}

impl SettingsSync {
    /// Create a settings sync over the given backend and session.
    pub fn new(
        api: Arc<dyn SensorApi>,
        session: Arc<SessionStore>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            api,
            session,
            events,
        }
    }

    /// Resolve the configuration to edit.
    ///
    /// An explicitly supplied configuration (e.g. reopening an editor
    /// that already holds one) is used as-is without a fetch.
    /// Otherwise the active configuration is fetched under the current
    /// session. On failure the error is surfaced and the caller keeps
    /// its prior or default values.
    pub async fn load(&self, initial: Option<ThresholdConfig>) -> Result<ThresholdConfig> {
        if let Some(config) = initial {
            return Ok(config);
        }
        let token = self.session.token().ok_or(Error::Unauthorized)?;
        match self.api.settings(&token).await {
            Ok(config) => Ok(config),
            Err(e) => {
                self.events.fault(FaultContext::Settings, e.to_string());
                Err(e)
            }
        }
    }

    /// Validate and persist a configuration.
    ///
    /// Missing required fields fail locally with
    /// [`Error::IncompleteSettings`] before any network call. On
    /// success [`AppEvent::SettingsSaved`] is emitted; on failure the
    /// error is surfaced and the caller's form state is left intact
    /// for retry.
    pub async fn save(&self, config: &ThresholdConfig) -> Result<()> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(Error::IncompleteSettings { missing });
        }

        let token = self.session.token().ok_or(Error::Unauthorized)?;
        if let Err(e) = self.api.save_settings(&token, config).await {
            self.events.fault(FaultContext::Settings, e.to_string());
            return Err(e);
        }

        info!(name = config.name.as_deref(), "Threshold settings saved");
        self.events.send(AppEvent::SettingsSaved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::mock::MockApi;
    use crate::session::MemoryTokenStore;

    fn sync(api: &Arc<MockApi>) -> SettingsSync {
        let session = Arc::new(SessionStore::new(MemoryTokenStore::with_token("tok")));
        session.hydrate();
        SettingsSync::new(api.clone(), session, EventDispatcher::new(16))
    }

    fn complete_config() -> ThresholdConfig {
        ThresholdConfig {
            name: Some("Tomatoes".to_string()),
            temp_min: Some(10.0),
            temp_max: Some(30.0),
            hum_min: Some(40.0),
            hum_max: Some(80.0),
            light_min: Some(200.0),
            light_max: Some(10_000.0),
            soil_min: Some(300.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_with_initial_skips_fetch() {
        let api = Arc::new(MockApi::new());
        let sync = sync(&api);

        let config = sync.load(Some(complete_config())).await.unwrap();
        assert_eq!(config, complete_config());
        assert_eq!(api.settings_calls(), 0);
    }

    #[tokio::test]
    async fn test_load_fetches_active_config() {
        let api = Arc::new(MockApi::new());
        api.set_settings(complete_config()).await;
        let sync = sync(&api);

        let config = sync.load(None).await.unwrap();
        assert_eq!(config, complete_config());
        assert_eq!(api.settings_calls(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_config_rejected_before_network() {
        let api = Arc::new(MockApi::new());
        let sync = sync(&api);

        let mut config = complete_config();
        config.hum_max = None;
        let err = sync.save(&config).await.unwrap_err();

        assert!(matches!(err, Error::IncompleteSettings { ref missing } if missing == &vec!["hum_max"]));
        assert_eq!(api.save_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_emits_settings_saved() {
        let api = Arc::new(MockApi::new());
        let sync = sync(&api);
        let mut events = sync.events.subscribe();

        sync.save(&complete_config()).await.unwrap();
        assert!(matches!(events.recv().await, Ok(AppEvent::SettingsSaved)));
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let api = Arc::new(MockApi::new());
        let sync = sync(&api);

        let config = complete_config();
        sync.save(&config).await.unwrap();
        let loaded = sync.load(None).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_failed_save_surfaces_fault() {
        let api = Arc::new(MockApi::new());
        api.set_fail_save(true);
        let sync = sync(&api);
        let mut events = sync.events.subscribe();

        assert!(sync.save(&complete_config()).await.is_err());
        assert!(matches!(
            events.recv().await,
            Ok(AppEvent::Fault {
                context: FaultContext::Settings,
                ..
            })
        ));
    }
}
