use std::{io::ErrorKind, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use therm_common::{
    HeaterCycleProtection, MonotonicClock, RuntimeConfig, Thermostat, ThermostatStatus,
};

use crate::sim::{RelayHeater, RoomThermometer, SimulatedRoom};

type SharedThermostat = Arc<Mutex<Thermostat<RelayHeater, MonotonicClock, RoomThermometer>>>;

struct ConfigStore {
    runtime_path: PathBuf,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let poll_override = std::env::var("THERM_POLL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok());
    let runtime = load_runtime(&ConfigStore::new(), poll_override).await?;

    let clock = MonotonicClock::new();
    let room = SimulatedRoom::new(runtime.simulation.clone());
    let protection = HeaterCycleProtection::new(room.heater(), clock, runtime.cycle.clone());
    let mut thermostat = Thermostat::new(
        protection,
        room.thermometer(),
        clock,
        runtime.thermostat.clone(),
    );

    if let Some(target) = runtime.settings.target_temp_f {
        thermostat
            .set_target_temperature(target)
            .context("invalid target temperature in runtime config")?;
    }
    thermostat
        .set_mode(runtime.settings.mode)
        .context("failed to apply initial mode")?;

    let thermostat: SharedThermostat = Arc::new(Mutex::new(thermostat));
    spawn_status_loop(
        Arc::clone(&thermostat),
        Duration::from_secs(runtime.status_interval_secs),
    );

    info!(
        "thermostat started in {} mode, polling every {}s",
        runtime.settings.mode, runtime.poll_interval_secs
    );

    let mut interval = tokio::time::interval(Duration::from_secs(runtime.poll_interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let result = { thermostat.lock().await.iterate() };
                if let Err(err) = result {
                    error!("control loop fault: {err}");
                    return Err(err).context("control loop halted");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for shutdown signal")?;
                info!("shutdown requested, leaving heater in its current state");
                return Ok(());
            }
        }
    }
}

/// A broken config file stops startup; only a missing one falls back to defaults.
async fn load_runtime(
    store: &ConfigStore,
    poll_override: Option<u64>,
) -> anyhow::Result<RuntimeConfig> {
    let mut runtime = store
        .load_runtime_config()
        .await
        .context("failed to load runtime config from store")?;
    if let Some(secs) = poll_override.filter(|secs| *secs > 0) {
        runtime.poll_interval_secs = secs;
    }
    Ok(runtime)
}

fn spawn_status_loop(thermostat: SharedThermostat, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let status = { thermostat.lock().await.status() };
            match status_json(&status) {
                Ok(body) => info!("thermostat state: {body}"),
                Err(err) => warn!("thermostat state serialization failed: {err}"),
            }
        }
    });
}

fn status_json(status: &ThermostatStatus) -> serde_json::Result<String> {
    serde_json::to_string(status)
}

impl ConfigStore {
    fn new() -> Self {
        let data_dir = std::env::var("THERM_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.therm"));
        Self::in_dir(data_dir)
    }

    fn in_dir(data_dir: PathBuf) -> Self {
        Self {
            runtime_path: data_dir.join("runtime.json"),
        }
    }

    async fn load_runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        match tokio::fs::read_to_string(&self.runtime_path).await {
            Ok(raw) => RuntimeConfig::parse(&raw)
                .with_context(|| format!("invalid config at {}", self.runtime_path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use therm_common::ThermostatMode;

    use super::*;

    #[tokio::test]
    async fn missing_config_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::in_dir(dir.path().to_path_buf());

        let runtime = store.load_runtime_config().await.unwrap();

        assert_eq!(runtime, RuntimeConfig::default());
    }

    #[tokio::test]
    async fn loads_config_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("runtime.json"),
            r#"{"settings": {"mode": "target", "target_temp_f": 71.5}}"#,
        )
        .unwrap();
        let store = ConfigStore::in_dir(dir.path().to_path_buf());

        let runtime = store.load_runtime_config().await.unwrap();

        assert_eq!(runtime.settings.mode, ThermostatMode::Target);
        assert_eq!(runtime.settings.target_temp_f, Some(71.5));
    }

    #[tokio::test]
    async fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("runtime.json"),
            r#"{"poll_interval_secs": 0}"#,
        )
        .unwrap();
        let store = ConfigStore::in_dir(dir.path().to_path_buf());

        let err = store.load_runtime_config().await.unwrap_err();

        assert!(format!("{err:#}").contains("poll_interval_secs"));
    }

    #[tokio::test]
    async fn startup_refuses_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("runtime.json"),
            r#"{"cycle": {"minimum_on_secs": 600, "maximum_on_secs": 60}}"#,
        )
        .unwrap();
        let store = ConfigStore::in_dir(dir.path().to_path_buf());

        let err = load_runtime(&store, None).await.unwrap_err();

        assert!(format!("{err:#}").contains("failed to load runtime config"));
    }

    #[tokio::test]
    async fn startup_applies_poll_override_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::in_dir(dir.path().to_path_buf());

        let runtime = load_runtime(&store, Some(2)).await.unwrap();
        assert_eq!(runtime.poll_interval_secs, 2);

        let runtime = load_runtime(&store, Some(0)).await.unwrap();
        assert_eq!(runtime.poll_interval_secs, RuntimeConfig::default().poll_interval_secs);
    }

    #[test]
    fn status_serializes_with_camel_case_keys() {
        let status = ThermostatStatus {
            current_temp: 66.5,
            target_temp: Some(68.0),
            threshold_low: Some(67.0),
            threshold_high: Some(69.0),
            mode: "target",
            heater_on: true,
            heater_actually_on: false,
            pending_transition: Some("TURN_ON"),
            pending_at: Some(300.0),
            below_low_secs: Some(120.0),
            above_high_secs: None,
        };

        let body = status_json(&status).unwrap();

        assert!(body.contains("\"heaterActuallyOn\":false"));
        assert!(body.contains("\"pendingTransition\":\"TURN_ON\""));
        assert!(body.contains("\"belowLowSecs\":120.0"));
    }
}
