use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use const_format::concatcp;
use eyre::{bail, Result as EyreResult};
use gatt_attest_config::ConfigFile;

use crate::defaults;

mod attest;
mod bank;
mod info;
mod init;
mod measure;
mod verify;

use attest::AttestCommand;
use info::InfoCommand;
use init::InitCommand;
use measure::MeasureCommand;
use verify::VerifyCommand;

pub const EXAMPLES: &str = r"
  # Initialize a device with a fresh attestation key
  $ attestd --home data/ init

  # Measure a kernel image into PCR 8
  $ attestd --home data/ measure --pcr 8 --file vmlinuz

  # Answer a verifier's nonce with evidence
  $ attestd --home data/ attest --nonce 6b1f...c2

  # Check the evidence against the same nonce
  $ attestd --home data/ verify --nonce 6b1f...c2 --evidence AQAAAEdD...
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  GATT_ATTEST_HOME    Directory for config and measurements\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Init(InitCommand),
    Measure(MeasureCommand),
    #[command(alias = "quote")]
    Attest(AttestCommand),
    Verify(VerifyCommand),
    Info(InfoCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// Directory for config and measurements
    #[arg(long, value_name = "PATH", default_value_t = defaults::default_home_dir())]
    #[arg(env = "GATT_ATTEST_HOME", hide_env_values = true)]
    pub home: Utf8PathBuf,
}

impl RootArgs {
    async fn load_config(&self) -> EyreResult<ConfigFile> {
        if !ConfigFile::exists(&self.home) {
            bail!("Device is not initialized in {:?}", self.home);
        }

        ConfigFile::load(&self.home).await
    }
}

impl RootCommand {
    pub async fn run(self) -> EyreResult<()> {
        match self.action {
            SubCommands::Init(init) => init.run(self.args).await,
            SubCommands::Measure(measure) => measure.run(self.args).await,
            SubCommands::Attest(attest) => attest.run(self.args).await,
            SubCommands::Verify(verify) => verify.run(self.args).await,
            SubCommands::Info(info) => info.run(self.args).await,
        }
    }
}
