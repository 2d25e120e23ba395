use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;
use eyre::Result as EyreResult;
use gatt_attest_attestation::SoftwareQuoteProvider;
use gatt_attest_config::load_event_log;
use gatt_attest_gatt::central::LocalCentral;
use gatt_attest_gatt::{attestation_chr, AttestationService, ConnId, Mtu};
use gatt_attest_primitives::nonce::Nonce;
use tracing::info;

use crate::cli::RootArgs;

/// Answer a verifier's nonce with attestation evidence
///
/// The nonce is written to the attestation characteristic and the evidence
/// read back, exactly as a BLE central would.
#[derive(Debug, Parser)]
pub struct AttestCommand {
    /// 32 byte verifier nonce, hex encoded
    #[arg(long, value_name = "HEX")]
    pub nonce: Nonce,

    /// ATT MTU of the simulated connection [default: from config.toml]
    #[arg(long, value_name = "BYTES")]
    pub mtu: Option<u16>,
}

impl AttestCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let config = root_args.load_config().await?;
        let log = load_event_log(&root_args.home, config.measurement.bank).await?;

        let mtu = self.mtu.map_or_else(|| config.mtu(), Mtu::new);
        let chr_config = config.chr_config();

        let service = Arc::new(AttestationService::new(
            SoftwareQuoteProvider::new(config.attestation_key, log),
            chr_config,
        ));
        let chr = attestation_chr(Arc::clone(&service));

        let central = LocalCentral::new(ConnId(0), mtu);

        central.write_long(&chr, self.nonce.as_bytes())?;
        let evidence = central.read_long(&chr)?;

        service.disconnect(central.conn());

        info!(nonce=%self.nonce, mtu=mtu.get(), len=evidence.len(), "Collected evidence");

        println!("{}", STANDARD.encode(evidence));

        Ok(())
    }
}
