use gatt_attest_primitives::event_log::{event_type, EventLogEntry};
use gatt_attest_primitives::pcr::{PcrBank, PcrIndex, PcrValue, PCR_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::AttestationError;

/// A PCR bank together with the event log that produced it.
///
/// PCR values are never stored on their own: they are always the replay of
/// `entries`, so the two cannot drift apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoredLog", try_from = "StoredLog")]
pub struct MeasurementLog {
    bank: PcrBank,
    pcrs: Vec<Vec<u8>>,
    entries: Vec<EventLogEntry>,
}

#[derive(Serialize, Deserialize)]
struct StoredLog {
    bank: PcrBank,
    entries: Vec<EventLogEntry>,
}

impl MeasurementLog {
    #[must_use]
    pub fn new(bank: PcrBank) -> Self {
        Self {
            bank,
            pcrs: vec![bank.zero(); PCR_COUNT],
            entries: Vec::new(),
        }
    }

    /// Rebuild the PCR bank from an event log.
    pub fn replay(bank: PcrBank, entries: Vec<EventLogEntry>) -> Result<Self, AttestationError> {
        let mut pcrs = vec![bank.zero(); PCR_COUNT];

        for (position, entry) in entries.iter().enumerate() {
            if entry.digest.len() != bank.digest_size() {
                return Err(AttestationError::EventDigestLength {
                    position,
                    pcr: entry.pcr_index,
                    expected: bank.digest_size(),
                    actual: entry.digest.len(),
                });
            }

            if bank.hash(&entry.data) != entry.digest {
                return Err(AttestationError::EventDigestMismatch {
                    position,
                    pcr: entry.pcr_index,
                });
            }

            if entry.event_type == event_type::NO_ACTION {
                continue;
            }

            let slot = &mut pcrs[entry.pcr_index.as_usize()];
            *slot = bank.extend(slot, &entry.digest);
        }

        Ok(Self {
            bank,
            pcrs,
            entries,
        })
    }

    #[must_use]
    pub const fn bank(&self) -> PcrBank {
        self.bank
    }

    #[must_use]
    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn pcr(&self, index: PcrIndex) -> &[u8] {
        &self.pcrs[index.as_usize()]
    }

    /// Measure `data` into `pcr`. `NO_ACTION` events are logged but not
    /// extended.
    pub fn measure(&mut self, pcr: PcrIndex, kind: u32, data: Vec<u8>) -> &EventLogEntry {
        let digest = self.bank.hash(&data);

        if kind != event_type::NO_ACTION {
            let slot = &mut self.pcrs[pcr.as_usize()];
            *slot = self.bank.extend(slot, &digest);
        }

        self.entries.push(EventLogEntry {
            pcr_index: pcr,
            event_type: kind,
            digest,
            data,
        });

        &self.entries[self.entries.len() - 1]
    }

    /// Current values of `selection`, in selection order.
    #[must_use]
    pub fn select(&self, selection: &[PcrIndex]) -> Vec<PcrValue> {
        selection
            .iter()
            .map(|&index| PcrValue {
                index,
                digest: self.pcr(index).to_vec(),
            })
            .collect()
    }
}

impl From<MeasurementLog> for StoredLog {
    fn from(log: MeasurementLog) -> Self {
        Self {
            bank: log.bank,
            entries: log.entries,
        }
    }
}

impl TryFrom<StoredLog> for MeasurementLog {
    type Error = AttestationError;

    fn try_from(stored: StoredLog) -> Result<Self, Self::Error> {
        Self::replay(stored.bank, stored.entries)
    }
}
