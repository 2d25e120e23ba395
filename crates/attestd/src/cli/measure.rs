use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{Result as EyreResult, WrapErr};
use gatt_attest_config::{load_event_log, save_event_log};
use gatt_attest_primitives::event_log::event_type;
use gatt_attest_primitives::pcr::PcrIndex;
use tokio::fs::read;
use tracing::info;

use crate::cli::RootArgs;

/// Measure data into a PCR and record it in the event log
#[derive(Debug, Parser)]
pub struct MeasureCommand {
    /// PCR to extend
    #[arg(long, value_name = "INDEX")]
    pub pcr: PcrIndex,

    /// TCG event type recorded with the measurement
    #[arg(long, value_name = "TYPE", default_value_t = event_type::IPL)]
    pub event_type: u32,

    /// Measure this string
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub data: Option<String>,

    /// Measure the contents of this file
    #[arg(long, value_name = "PATH")]
    pub file: Option<Utf8PathBuf>,
}

impl MeasureCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let config = root_args.load_config().await?;
        let mut log = load_event_log(&root_args.home, config.measurement.bank).await?;

        let data = match (self.data, self.file) {
            (Some(data), _) => data.into_bytes(),
            (None, Some(file)) => read(&file)
                .await
                .wrap_err_with(|| format!("failed to read {file:?}"))?,
            (None, None) => Vec::new(),
        };

        let digest = hex::encode(&log.measure(self.pcr, self.event_type, data).digest);
        let value = hex::encode(log.pcr(self.pcr));

        save_event_log(&root_args.home, &log).await?;

        info!(pcr=%self.pcr, event_type=self.event_type, %digest, "Measured event");

        println!("{value}");

        Ok(())
    }
}
