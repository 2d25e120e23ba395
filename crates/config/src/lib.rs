use core::time::Duration;

use camino::Utf8Path;
use eyre::{bail, Result as EyreResult, WrapErr};
use gatt_attest_attestation::{validate_selection, AttestationKey, MeasurementLog};
use gatt_attest_gatt::{AttestationChrConfig, Mtu};
use gatt_attest_primitives::pcr::{PcrBank, PcrIndex};
use serde::{Deserialize, Serialize};
use tokio::fs::{read_to_string, write};

pub const CONFIG_FILE: &str = "config.toml";
pub const EVENT_LOG_FILE: &str = "eventlog.json";

/// Upper bound for `characteristic.nonce_history`.
pub const MAX_NONCE_HISTORY: usize = 1 << 20;

#[derive(Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct ConfigFile {
    pub attestation_key: AttestationKey,

    pub measurement: MeasurementConfig,

    #[serde(default)]
    pub characteristic: CharacteristicConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct MeasurementConfig {
    pub bank: PcrBank,
    /// PCRs covered by every quote, in quote order.
    pub pcr_select: Vec<PcrIndex>,
}

impl MeasurementConfig {
    #[must_use]
    pub const fn new(bank: PcrBank, pcr_select: Vec<PcrIndex>) -> Self {
        Self { bank, pcr_select }
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct CharacteristicConfig {
    #[serde(rename = "nonce_ttl_ms", with = "serde_duration")]
    pub nonce_ttl: Duration,
    /// ATT MTU used by `attest` when driving the characteristic locally.
    pub mtu: u16,
    pub nonce_history: usize,
}

impl CharacteristicConfig {
    #[must_use]
    pub const fn new(nonce_ttl: Duration, mtu: u16, nonce_history: usize) -> Self {
        Self {
            nonce_ttl,
            mtu,
            nonce_history,
        }
    }
}

impl Default for CharacteristicConfig {
    fn default() -> Self {
        let defaults = AttestationChrConfig::default();

        Self::new(
            defaults.nonce_ttl,
            Mtu::DEFAULT.get(),
            defaults.nonce_history,
        )
    }
}

impl ConfigFile {
    #[must_use]
    pub const fn new(
        attestation_key: AttestationKey,
        measurement: MeasurementConfig,
        characteristic: CharacteristicConfig,
    ) -> Self {
        Self {
            attestation_key,
            measurement,
            characteristic,
        }
    }

    #[must_use]
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub async fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .await
            .wrap_err_with(|| format!("failed to read configuration from {path:?}"))?;

        let config: Self = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse configuration from {path:?}"))?;

        config
            .validate()
            .wrap_err_with(|| format!("invalid configuration in {path:?}"))?;

        Ok(config)
    }

    /// Reject settings every later `attest` would trip over.
    pub fn validate(&self) -> EyreResult<()> {
        validate_selection(&self.measurement.pcr_select)
            .wrap_err("measurement.pcr_select is unusable")?;

        if self.characteristic.nonce_history > MAX_NONCE_HISTORY {
            bail!(
                "characteristic.nonce_history is {}, at most {MAX_NONCE_HISTORY} is allowed",
                self.characteristic.nonce_history
            );
        }

        Ok(())
    }

    pub async fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .await
            .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;

        Ok(())
    }

    /// Settings for the attestation characteristic.
    #[must_use]
    pub fn chr_config(&self) -> AttestationChrConfig {
        AttestationChrConfig {
            selection: self.measurement.pcr_select.clone(),
            nonce_ttl: self.characteristic.nonce_ttl,
            nonce_history: self.characteristic.nonce_history,
        }
    }

    #[must_use]
    pub fn mtu(&self) -> Mtu {
        Mtu::new(self.characteristic.mtu)
    }
}

/// Load the measurement log kept next to the configuration, or start an
/// empty one if nothing was measured yet.
///
/// PCR values are rebuilt by replaying the stored events.
pub async fn load_event_log(dir: &Utf8Path, bank: PcrBank) -> EyreResult<MeasurementLog> {
    let path = dir.join(EVENT_LOG_FILE);

    if !path.is_file() {
        return Ok(MeasurementLog::new(bank));
    }

    let content = read_to_string(&path)
        .await
        .wrap_err_with(|| format!("failed to read event log from {path:?}"))?;

    let log: MeasurementLog = serde_json::from_str(&content)
        .wrap_err_with(|| format!("failed to replay event log from {path:?}"))?;

    if log.bank() != bank {
        bail!(
            "event log in {path:?} was measured into the {} bank, configuration expects {bank}",
            log.bank()
        );
    }

    Ok(log)
}

pub async fn save_event_log(dir: &Utf8Path, log: &MeasurementLog) -> EyreResult<()> {
    let path = dir.join(EVENT_LOG_FILE);
    let content = serde_json::to_string_pretty(log)?;

    write(&path, content)
        .await
        .wrap_err_with(|| format!("failed to write event log to {path:?}"))?;

    Ok(())
}

mod serde_duration {
    use core::time::Duration;

    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).map_err(S::Error::custom)?;

        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;
