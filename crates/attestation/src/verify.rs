//! Evidence verification.

#[cfg(test)]
#[path = "tests/verify.rs"]
mod tests;

use ed25519_dalek::VerifyingKey;
use gatt_attest_primitives::evidence::{Evidence, ATTEST_QUOTE, QUOTE_MAGIC};
use gatt_attest_primitives::nonce::Nonce;
use gatt_attest_primitives::pcr::PcrValue;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AttestationError;
use crate::key::verify_signature;
use crate::measurement::MeasurementLog;

/// Golden PCR values the verifier expects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub pcrs: Vec<PcrValue>,
}

/// Outcome of each individual check. Evidence is only trustworthy if
/// [`VerificationResult::is_valid`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag is reported to the verifier on its own"
)]
pub struct VerificationResult {
    /// The quote is signed by the trusted attestation key.
    pub quote_verified: bool,
    /// The quote embeds the verifier's nonce.
    pub nonce_verified: bool,
    /// The reported PCRs match the quote's selection and digest.
    pub pcrs_verified: bool,
    /// Replaying the event log reproduces the reported PCRs.
    pub event_log_verified: bool,
    /// The reported PCRs match every golden value in the policy.
    pub policy_verified: bool,
}

impl VerificationResult {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.quote_verified
            && self.nonce_verified
            && self.pcrs_verified
            && self.event_log_verified
            && self.policy_verified
    }
}

/// Decode borsh encoded evidence and verify it.
pub fn verify_evidence_bytes(
    bytes: &[u8],
    expected_nonce: &Nonce,
    trusted_key: &VerifyingKey,
    policy: Option<&Policy>,
) -> Result<VerificationResult, AttestationError> {
    let evidence = Evidence::from_bytes(bytes)
        .map_err(|err| AttestationError::QuoteParsingFailed(err.to_string()))?;

    verify_evidence(&evidence, expected_nonce, trusted_key, policy)
}

/// Verify evidence against the nonce the verifier wrote and the attestation
/// key it trusts.
///
/// Structural problems (wrong magic, wrong attestation type) are errors;
/// everything else is reported through the flags of [`VerificationResult`].
pub fn verify_evidence(
    evidence: &Evidence,
    expected_nonce: &Nonce,
    trusted_key: &VerifyingKey,
    policy: Option<&Policy>,
) -> Result<VerificationResult, AttestationError> {
    let quote = &evidence.quote;

    if quote.info.magic != QUOTE_MAGIC {
        return Err(AttestationError::QuoteParsingFailed(format!(
            "unexpected magic {:#010x}",
            quote.info.magic
        )));
    }

    if quote.info.attest_type != ATTEST_QUOTE {
        return Err(AttestationError::QuoteParsingFailed(format!(
            "unexpected attestation type {:#06x}",
            quote.info.attest_type
        )));
    }

    let quote_verified = quote.attestation_key == trusted_key.to_bytes()
        && verify_signature(trusted_key, &quote.info.signing_bytes()?, &quote.signature);

    let nonce_verified = quote.info.extra_data == *expected_nonce;

    let pcrs_verified = check_pcrs(evidence);

    let event_log_verified = check_event_log(evidence);

    let policy_verified = policy.map_or(true, |policy| check_policy(evidence, policy));

    let result = VerificationResult {
        quote_verified,
        nonce_verified,
        pcrs_verified,
        event_log_verified,
        policy_verified,
    };

    if result.is_valid() {
        info!(nonce=%expected_nonce, "Evidence verification passed");
    } else {
        warn!(?result, nonce=%expected_nonce, "Evidence verification failed");
    }

    Ok(result)
}

fn check_pcrs(evidence: &Evidence) -> bool {
    let info = &evidence.quote.info;
    let bank = info.bank;

    let matches_selection = evidence.pcrs.len() == info.pcr_select.len()
        && evidence
            .pcrs
            .iter()
            .zip(&info.pcr_select)
            .all(|(pcr, index)| pcr.index == *index && pcr.digest.len() == bank.digest_size());

    matches_selection
        && bank.hash_all(evidence.pcrs.iter().map(|pcr| pcr.digest.as_slice())) == info.pcr_digest
}

fn check_event_log(evidence: &Evidence) -> bool {
    let replayed = match MeasurementLog::replay(
        evidence.quote.info.bank,
        evidence.event_log.clone(),
    ) {
        Ok(log) => log,
        Err(err) => {
            warn!(%err, "Event log replay failed");
            return false;
        }
    };

    evidence
        .pcrs
        .iter()
        .all(|pcr| replayed.pcr(pcr.index) == pcr.digest.as_slice())
}

fn check_policy(evidence: &Evidence, policy: &Policy) -> bool {
    policy.pcrs.iter().all(|golden| {
        evidence
            .pcrs
            .iter()
            .find(|pcr| pcr.index == golden.index)
            .is_some_and(|pcr| pcr.digest == golden.digest)
    })
}
