//! Shared types for attestation evidence served over BLE.
//!
//! Everything a device and a verifier have to agree on lives here: Bluetooth
//! UUIDs, the anti-replay nonce, PCR banks and values, event-log entries and
//! the signed quote, together with their borsh wire encoding.

pub mod common;
pub mod error;
pub mod event_log;
pub mod evidence;
pub mod nonce;
pub mod pcr;
pub mod uuid;

pub use error::PrimitivesError;
