use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use gatt_attest_attestation::{AttestationKey, MeasurementLog};
use gatt_attest_config::{
    save_event_log, CharacteristicConfig, ConfigFile, MeasurementConfig,
};
use gatt_attest_gatt::AttestationChrConfig;
use gatt_attest_primitives::pcr::{PcrBank, PcrIndex};
use rand::thread_rng;
use tokio::fs::create_dir_all;
use tracing::{info, warn};

use super::bank::BankArg;
use crate::cli::RootArgs;

/// Initialize a device: generate its attestation key and reset its PCRs
#[derive(Debug, Parser)]
pub struct InitCommand {
    /// Hash algorithm of the PCR bank
    #[arg(long, value_enum, default_value_t = BankArg::Sha256)]
    pub bank: BankArg,

    /// PCRs covered by every quote [default: 0,4,8,10]
    #[arg(long, value_name = "INDEX", value_delimiter = ',')]
    pub pcrs: Vec<PcrIndex>,

    /// Overwrite an existing configuration and measurement log
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let path = root_args.home;

        if ConfigFile::exists(&path) {
            if !self.force {
                bail!("Device is already initialized in {:?}", path);
            }

            warn!(home=%path, "Overwriting existing device configuration");
        }

        let bank = PcrBank::from(self.bank);
        let selection = if self.pcrs.is_empty() {
            AttestationChrConfig::default().selection
        } else {
            self.pcrs
        };

        let config = ConfigFile::new(
            AttestationKey::generate(&mut thread_rng()),
            MeasurementConfig::new(bank, selection),
            CharacteristicConfig::default(),
        );

        config.validate()?;

        create_dir_all(&path)
            .await
            .wrap_err_with(|| format!("failed to create home directory {path:?}"))?;

        config.save(&path).await?;
        save_event_log(&path, &MeasurementLog::new(bank)).await?;

        info!(
            home=%path,
            %bank,
            public_key=%hex::encode(config.attestation_key.public_key_bytes()),
            "Initialized attestation device"
        );

        Ok(())
    }
}
