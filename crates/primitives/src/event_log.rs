use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::common::serde_hex;
use crate::pcr::PcrIndex;

/// Well-known TCG event types.
pub mod event_type {
    pub const POST_CODE: u32 = 0x0000_0001;
    pub const NO_ACTION: u32 = 0x0000_0003;
    pub const SEPARATOR: u32 = 0x0000_0004;
    pub const ACTION: u32 = 0x0000_0005;
    pub const IPL: u32 = 0x0000_000d;
}

/// One measurement: `digest` was extended into `pcr_index`.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub pcr_index: PcrIndex,
    pub event_type: u32,
    #[serde(with = "serde_hex")]
    pub digest: Vec<u8>,
    #[serde(with = "serde_hex")]
    pub data: Vec<u8>,
}
