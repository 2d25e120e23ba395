//! Attestation evidence generation and verification.
//!
//! This crate provides:
//! - A measurement log that extends PCRs and records the matching event log
//! - Quote generation behind the [`QuoteProvider`] trait, with a software
//!   root of trust ([`SoftwareQuoteProvider`]) signing with an ed25519
//!   attestation key
//! - Verification of evidence against a verifier nonce, a trusted attestation
//!   key and an optional golden-value policy
//!
//! # Example
//!
//! ```ignore
//! use gatt_attest_attestation::{verify_evidence, AttestationKey, MeasurementLog, QuoteProvider, SoftwareQuoteProvider};
//!
//! let mut log = MeasurementLog::new(PcrBank::Sha256);
//! log.measure(PcrIndex::KERNEL, event_type::IPL, b"kernel image".to_vec());
//!
//! let key = AttestationKey::generate(&mut rand::thread_rng());
//! let trusted = key.public_key();
//! let mut provider = SoftwareQuoteProvider::new(key, log);
//!
//! let nonce = Nonce::random(&mut rand::thread_rng());
//! let evidence = provider.quote(&nonce, &[PcrIndex::KERNEL])?;
//!
//! let result = verify_evidence(&evidence, &nonce, &trusted, None)?;
//! assert!(result.is_valid());
//! ```
//!
//! **Warning**: the software provider keeps its attestation key in process
//! memory. It proves possession of that key, not the integrity of the
//! hardware the process runs on.

mod error;
mod generate;
mod key;
mod measurement;
mod verify;

pub use error::AttestationError;
pub use generate::{validate_selection, QuoteProvider, SoftwareQuoteProvider};
pub use key::{parse_public_key, AttestationKey};
pub use measurement::MeasurementLog;
pub use verify::{verify_evidence, verify_evidence_bytes, Policy, VerificationResult};
