//! The attestation characteristic.
//!
//! Write path: the verifier writes a 32 byte nonce, possibly as a long write
//! split over several Prepare Write fragments. Read path: the first read at
//! offset 0 consumes the nonce and generates evidence; Read Blob requests then
//! page through the cached encoding.

use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use gatt_attest_attestation::QuoteProvider;
use gatt_attest_primitives::nonce::{Nonce, NONCE_LEN};
use gatt_attest_primitives::pcr::PcrIndex;
use gatt_attest_primitives::PrimitivesError;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::att::{AttError, ConnId};
use crate::characteristic::{
    Characteristic, Descriptor, ReadHandler, ReadRequest, WriteHandler, WriteRequest,
};
use crate::session::{is_complete, NonceHistory, Session};
use crate::{ATTESTATION_CHR_UUID, USER_DESCRIPTION_UUID};

pub const USER_DESCRIPTION: &str = "Remote attestation evidence";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationChrConfig {
    /// PCRs covered by every quote, in quote order.
    pub selection: Vec<PcrIndex>,
    /// How long an armed nonce stays valid before the first read.
    pub nonce_ttl: Duration,
    /// How many past nonces are remembered to refuse reuse.
    pub nonce_history: usize,
}

impl Default for AttestationChrConfig {
    fn default() -> Self {
        Self {
            selection: vec![
                PcrIndex::FIRMWARE,
                PcrIndex::BOOT_LOADER,
                PcrIndex::KERNEL,
                PcrIndex::APPLICATION,
            ],
            nonce_ttl: Duration::from_secs(30),
            nonce_history: 1024,
        }
    }
}

/// State shared by the read and write handlers of the attestation
/// characteristic.
pub struct AttestationService {
    provider: Mutex<Box<dyn QuoteProvider>>,
    config: AttestationChrConfig,
    sessions: DashMap<ConnId, Session>,
    history: Mutex<NonceHistory>,
}

impl AttestationService {
    pub fn new<P: QuoteProvider + 'static>(provider: P, config: AttestationChrConfig) -> Self {
        Self {
            provider: Mutex::new(Box::new(provider)),
            history: Mutex::new(NonceHistory::new(config.nonce_history)),
            config,
            sessions: DashMap::new(),
        }
    }

    /// Forget everything about a connection that went away.
    pub fn disconnect(&self, conn: ConnId) {
        if self.sessions.remove(&conn).is_some() {
            debug!(%conn, "Dropped attestation session");
        }
    }

    /// Number of connections with an active session.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Rejected writes leave the session as it was.
    fn write_nonce(&self, req: &WriteRequest<'_>) -> Result<(), AttError> {
        let mut session = self.sessions.entry(req.conn).or_default();

        let buf = match (&*session, req.offset) {
            (_, 0) => req.value.to_vec(),
            (Session::Writing { buf }, offset) if buf.len() == offset => {
                [buf.as_slice(), req.value].concat()
            }
            _ => {
                warn!(conn=%req.conn, offset=req.offset, "Nonce fragment out of sequence");
                return Err(AttError::InvalidOffset);
            }
        };

        if buf.len() > NONCE_LEN {
            warn!(conn=%req.conn, len=buf.len(), "Nonce too long");
            return Err(AttError::InvalidAttributeValueLength);
        }

        if !is_complete(buf.len()) {
            *session = Session::Writing { buf };
            return Ok(());
        }

        let nonce = match Nonce::from_slice(&buf) {
            Ok(nonce) => nonce,
            Err(PrimitivesError::ZeroNonce) => {
                warn!(conn=%req.conn, "Rejected all-zero nonce");
                return Err(AttError::ValueNotAllowed);
            }
            Err(err) => {
                error!(conn=%req.conn, %err, "Failed to parse nonce");
                return Err(AttError::UnlikelyError);
            }
        };

        if !self.history.lock().insert(nonce) {
            warn!(conn=%req.conn, %nonce, "Rejected reused nonce");
            return Err(AttError::NonceReused);
        }

        info!(conn=%req.conn, %nonce, "Nonce armed");

        *session = Session::Challenged {
            nonce,
            armed_at: Instant::now(),
        };

        Ok(())
    }

    fn read_evidence(&self, req: &ReadRequest) -> Result<Vec<u8>, AttError> {
        if req.offset > 0 {
            let Some(session) = self.sessions.get(&req.conn) else {
                debug!(conn=%req.conn, "Blob read without a session");
                return Err(AttError::InvalidOffset);
            };

            let Session::Serving { encoded, .. } = &*session else {
                return Err(AttError::InvalidOffset);
            };

            return page(encoded, req);
        }

        let (nonce, armed_at) = self.consume_nonce(req.conn)?;

        if armed_at.elapsed() >= self.config.nonce_ttl {
            warn!(conn=%req.conn, %nonce, "Nonce expired before read");
            return Err(AttError::NonceExpired);
        }

        // No session guard is held while signing.
        let evidence = self
            .provider
            .lock()
            .quote(&nonce, &self.config.selection)
            .map_err(|err| {
                error!(conn=%req.conn, %nonce, %err, "Failed to generate evidence");
                AttError::UnlikelyError
            })?;

        let encoded = evidence.to_bytes().map_err(|err| {
            error!(conn=%req.conn, %nonce, %err, "Failed to encode evidence");
            AttError::UnlikelyError
        })?;

        info!(conn=%req.conn, %nonce, len=encoded.len(), "Serving attestation evidence");

        let first = page(&encoded, req);

        match self.sessions.get_mut(&req.conn) {
            Some(mut session) if matches!(*session, Session::Idle) => {
                *session = Session::Serving { nonce, encoded };
            }
            _ => debug!(conn=%req.conn, %nonce, "Session moved on while quoting, evidence not cached"),
        }

        first
    }

    /// Take the armed nonce out of the session. The nonce is spent even if
    /// no evidence comes of it.
    fn consume_nonce(&self, conn: ConnId) -> Result<(Nonce, Instant), AttError> {
        let Some(mut session) = self.sessions.get_mut(&conn) else {
            debug!(%conn, "Read without a session");
            return Err(AttError::NoNonce);
        };

        match &*session {
            Session::Challenged { nonce, armed_at } => {
                let armed = (*nonce, *armed_at);
                *session = Session::Idle;
                Ok(armed)
            }
            Session::Serving { nonce, .. } => {
                warn!(%conn, %nonce, "Evidence re-read from start, nonce already consumed");
                Err(AttError::NoNonce)
            }
            Session::Idle | Session::Writing { .. } => {
                debug!(%conn, "Read without an armed nonce");
                Err(AttError::NoNonce)
            }
        }
    }
}

fn page(encoded: &[u8], req: &ReadRequest) -> Result<Vec<u8>, AttError> {
    let rest = encoded.get(req.offset..).ok_or(AttError::InvalidOffset)?;
    let len = rest.len().min(req.mtu.read_payload());

    Ok(rest[..len].to_vec())
}

impl core::fmt::Debug for AttestationService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AttestationService")
            .field("config", &self.config)
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct NonceWriter(Arc<AttestationService>);

impl WriteHandler for NonceWriter {
    fn serve_write(&self, req: &WriteRequest<'_>) -> Result<(), AttError> {
        self.0.write_nonce(req)
    }
}

#[derive(Debug)]
struct EvidenceReader(Arc<AttestationService>);

impl ReadHandler for EvidenceReader {
    fn serve_read(&self, req: &ReadRequest) -> Result<Vec<u8>, AttError> {
        self.0.read_evidence(req)
    }
}

/// Build the attestation characteristic.
///
/// Writes carry the verifier's nonce; reads return the evidence that quotes
/// it.
#[must_use]
pub fn attestation_chr(service: Arc<AttestationService>) -> Characteristic {
    Characteristic::new(ATTESTATION_CHR_UUID)
        .with_descriptor(Descriptor::new(USER_DESCRIPTION_UUID, USER_DESCRIPTION))
        .handle_write(NonceWriter(Arc::clone(&service)))
        .handle_read(EvidenceReader(service))
}
