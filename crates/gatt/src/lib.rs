//! A GATT characteristic that serves remote-attestation evidence.
//!
//! The verifier writes a fresh nonce to [`ATTESTATION_CHR_UUID`] and then
//! reads the characteristic back; the value is borsh encoded
//! [`Evidence`](gatt_attest_primitives::evidence::Evidence) whose quote embeds
//! that nonce. Each nonce yields exactly one quote.
//!
//! Radio bring-up, advertising and service registration belong to the host's
//! BLE stack; this crate only models what happens behind one characteristic.

use gatt_attest_primitives::uuid::Uuid;

pub mod att;
pub mod attestation;
pub mod central;
pub mod characteristic;
mod session;

pub use att::{AttError, ConnId, Mtu};
pub use attestation::{attestation_chr, AttestationChrConfig, AttestationService};
pub use characteristic::{
    Characteristic, Descriptor, Property, ReadHandler, ReadRequest, WriteHandler, WriteRequest,
};

/// Primary service grouping the attestation characteristic.
pub const ATTESTATION_SERVICE_UUID: Uuid = Uuid::from_u128(0x7c3e_1a50_9b4d_4f6e_a1c2_5d8e_9f0a_3b71);

/// Attestation characteristic: write a nonce, read evidence.
pub const ATTESTATION_CHR_UUID: Uuid = Uuid::from_u128(0x7c3e_1a52_9b4d_4f6e_a1c2_5d8e_9f0a_3b71);

/// Characteristic User Description descriptor.
pub const USER_DESCRIPTION_UUID: Uuid = Uuid::from_u16(0x2901);
