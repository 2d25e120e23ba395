use clap::ValueEnum;
use gatt_attest_primitives::pcr::PcrBank;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum BankArg {
    Sha256,
    Sha384,
}

impl From<BankArg> for PcrBank {
    fn from(value: BankArg) -> Self {
        match value {
            BankArg::Sha256 => Self::Sha256,
            BankArg::Sha384 => Self::Sha384,
        }
    }
}
