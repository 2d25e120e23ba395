//! Quote generation.

use std::collections::BTreeSet;

use ed25519_dalek::VerifyingKey;
use gatt_attest_primitives::evidence::{
    Evidence, Quote, QuoteInfo, ATTEST_QUOTE, EVIDENCE_VERSION, QUOTE_MAGIC,
};
use gatt_attest_primitives::nonce::Nonce;
use gatt_attest_primitives::pcr::PcrIndex;
use tracing::{debug, info};

use crate::error::AttestationError;
use crate::key::AttestationKey;
use crate::measurement::MeasurementLog;

/// Source of signed evidence.
///
/// The software provider below is the only implementation shipped here; a
/// hardware TPM backend plugs in at this seam.
pub trait QuoteProvider: Send {
    fn attestation_key(&self) -> VerifyingKey;

    /// Produce evidence over `selection` whose quote embeds `nonce`.
    fn quote(&mut self, nonce: &Nonce, selection: &[PcrIndex])
        -> Result<Evidence, AttestationError>;
}

/// Quotes signed by an in-memory attestation key over a software PCR bank.
#[derive(Debug)]
pub struct SoftwareQuoteProvider {
    key: AttestationKey,
    log: MeasurementLog,
    reset_count: u32,
    clock: u64,
}

impl SoftwareQuoteProvider {
    #[must_use]
    pub const fn new(key: AttestationKey, log: MeasurementLog) -> Self {
        Self {
            key,
            log,
            reset_count: 0,
            clock: 0,
        }
    }

    #[must_use]
    pub const fn log(&self) -> &MeasurementLog {
        &self.log
    }
}

impl QuoteProvider for SoftwareQuoteProvider {
    fn attestation_key(&self) -> VerifyingKey {
        self.key.public_key()
    }

    fn quote(
        &mut self,
        nonce: &Nonce,
        selection: &[PcrIndex],
    ) -> Result<Evidence, AttestationError> {
        validate_selection(selection)?;

        let bank = self.log.bank();
        let pcrs = self.log.select(selection);
        let pcr_digest = bank.hash_all(pcrs.iter().map(|pcr| pcr.digest.as_slice()));

        self.clock = self.clock.wrapping_add(1);

        let info = QuoteInfo {
            magic: QUOTE_MAGIC,
            attest_type: ATTEST_QUOTE,
            bank,
            pcr_select: selection.to_vec(),
            pcr_digest,
            extra_data: *nonce,
            reset_count: self.reset_count,
            clock: self.clock,
        };

        let message = info
            .signing_bytes()
            .map_err(|err| AttestationError::QuoteGenerationFailed(err.to_string()))?;

        let signature = self.key.sign(&message);

        debug!(
            clock = self.clock,
            events = self.log.entries().len(),
            "Signed quote"
        );
        info!(%nonce, pcrs = ?selection, "Generated attestation evidence");

        Ok(Evidence {
            version: EVIDENCE_VERSION,
            quote: Quote {
                info,
                attestation_key: self.key.public_key_bytes(),
                signature,
            },
            pcrs,
            event_log: self.log.entries().to_vec(),
        })
    }
}

/// Check that `selection` names at least one PCR and none twice.
pub fn validate_selection(selection: &[PcrIndex]) -> Result<(), AttestationError> {
    if selection.is_empty() {
        return Err(AttestationError::InvalidSelection(
            "at least one pcr must be selected".to_owned(),
        ));
    }

    let mut seen = BTreeSet::new();
    for index in selection {
        if !seen.insert(*index) {
            return Err(AttestationError::InvalidSelection(format!(
                "pcr {index} selected twice"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use gatt_attest_primitives::event_log::event_type;
    use gatt_attest_primitives::pcr::PcrBank;
    use rand::thread_rng;

    use super::*;

    fn provider() -> SoftwareQuoteProvider {
        let mut log = MeasurementLog::new(PcrBank::Sha256);
        let _ = log.measure(PcrIndex::BOOT_LOADER, event_type::IPL, b"loader".to_vec());
        let _ = log.measure(PcrIndex::KERNEL, event_type::IPL, b"kernel".to_vec());

        SoftwareQuoteProvider::new(AttestationKey::generate(&mut thread_rng()), log)
    }

    #[test]
    fn test_quote_embeds_nonce_and_selection() {
        let mut provider = provider();
        let nonce = Nonce::random(&mut thread_rng());
        let selection = [PcrIndex::KERNEL, PcrIndex::BOOT_LOADER];

        let evidence = provider.quote(&nonce, &selection).unwrap();

        assert_eq!(evidence.quote.info.extra_data, nonce);
        assert_eq!(evidence.quote.info.pcr_select, selection);
        assert_eq!(evidence.pcrs[0].index, PcrIndex::KERNEL);
        assert_eq!(evidence.pcrs[0].digest, provider.log().pcr(PcrIndex::KERNEL));
        assert_eq!(evidence.event_log.len(), 2);
        assert_eq!(
            evidence.quote.attestation_key,
            provider.attestation_key().to_bytes()
        );
    }

    #[test]
    fn test_clock_advances_per_quote() {
        let mut provider = provider();
        let nonce = Nonce::random(&mut thread_rng());

        let first = provider.quote(&nonce, &[PcrIndex::KERNEL]).unwrap();
        let second = provider.quote(&nonce, &[PcrIndex::KERNEL]).unwrap();

        assert!(
            second.quote.info.clock > first.quote.info.clock,
            "clock must be monotonic"
        );
    }

    #[test]
    fn test_rejects_bad_selection() {
        let mut provider = provider();
        let nonce = Nonce::random(&mut thread_rng());

        assert!(
            matches!(
                provider.quote(&nonce, &[]),
                Err(AttestationError::InvalidSelection(_))
            ),
            "empty selection"
        );
        assert!(
            matches!(
                provider.quote(&nonce, &[PcrIndex::KERNEL, PcrIndex::KERNEL]),
                Err(AttestationError::InvalidSelection(_))
            ),
            "duplicate selection"
        );
    }
}
