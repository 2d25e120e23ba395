use clap::Parser;
use eyre::Result as EyreResult;
use gatt_attest_config::load_event_log;
use gatt_attest_gatt::{ATTESTATION_CHR_UUID, ATTESTATION_SERVICE_UUID};
use gatt_attest_primitives::pcr::{PcrIndex, PCR_COUNT};
use serde_json::json;

use crate::cli::RootArgs;

/// Show the device's identity and current PCR values
#[derive(Debug, Parser)]
pub struct InfoCommand {
    /// List every PCR, not only the ones covered by quotes
    #[arg(long)]
    pub all: bool,
}

impl InfoCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let config = root_args.load_config().await?;
        let log = load_event_log(&root_args.home, config.measurement.bank).await?;

        let indices = if self.all {
            (0..PCR_COUNT)
                .filter_map(|index| u8::try_from(index).ok())
                .map(PcrIndex::new)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            config.measurement.pcr_select.clone()
        };

        let info = json!({
            "service": ATTESTATION_SERVICE_UUID,
            "characteristic": ATTESTATION_CHR_UUID,
            "publicKey": hex::encode(config.attestation_key.public_key_bytes()),
            "bank": config.measurement.bank,
            "pcrSelect": config.measurement.pcr_select,
            "pcrs": log.select(&indices),
            "events": log.entries().len(),
        });

        println!("{}", serde_json::to_string_pretty(&info)?);

        Ok(())
    }
}
