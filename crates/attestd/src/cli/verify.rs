use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use gatt_attest_attestation::{parse_public_key, verify_evidence_bytes, Policy};
use gatt_attest_primitives::nonce::Nonce;
use tokio::fs::read_to_string;

use crate::cli::RootArgs;

/// Verify attestation evidence against a nonce and a trusted key
#[derive(Debug, Parser)]
pub struct VerifyCommand {
    /// Evidence printed by `attest`, base64 encoded
    #[arg(long, value_name = "BASE64")]
    pub evidence: String,

    /// Nonce the evidence must answer, hex encoded
    #[arg(long, value_name = "HEX")]
    pub nonce: Nonce,

    /// Trusted attestation key, hex encoded [default: this device's key]
    #[arg(long, value_name = "HEX")]
    pub public_key: Option<String>,

    /// JSON file with golden PCR values
    #[arg(long, value_name = "PATH")]
    pub policy: Option<Utf8PathBuf>,
}

impl VerifyCommand {
    pub async fn run(self, root_args: RootArgs) -> EyreResult<()> {
        let trusted = match self.public_key {
            Some(key) => parse_public_key(&key)?,
            None => root_args.load_config().await?.attestation_key.public_key(),
        };

        let policy = match self.policy {
            Some(path) => {
                let content = read_to_string(&path)
                    .await
                    .wrap_err_with(|| format!("failed to read policy from {path:?}"))?;

                Some(
                    serde_json::from_str::<Policy>(&content)
                        .wrap_err_with(|| format!("failed to parse policy from {path:?}"))?,
                )
            }
            None => None,
        };

        let bytes = STANDARD
            .decode(self.evidence.trim())
            .wrap_err("evidence is not valid base64")?;

        let result = verify_evidence_bytes(&bytes, &self.nonce, &trusted, policy.as_ref())?;

        println!("{}", serde_json::to_string_pretty(&result)?);

        if !result.is_valid() {
            bail!("Evidence failed verification");
        }

        Ok(())
    }
}
