//! The verifier side of the exchange, driving a [`Characteristic`] in process
//! the way a central's ATT client would over the air.

use tracing::trace;

use crate::att::{AttError, ConnId, Mtu};
use crate::characteristic::{Characteristic, ReadRequest, WriteRequest};

#[derive(Clone, Copy, Debug)]
pub struct LocalCentral {
    conn: ConnId,
    mtu: Mtu,
}

impl LocalCentral {
    #[must_use]
    pub const fn new(conn: ConnId, mtu: Mtu) -> Self {
        Self { conn, mtu }
    }

    #[must_use]
    pub const fn conn(&self) -> ConnId {
        self.conn
    }

    /// Write `value`, splitting it into Prepare Write fragments when it does
    /// not fit a single request.
    pub fn write_long(&self, chr: &Characteristic, value: &[u8]) -> Result<(), AttError> {
        let chunk = self.mtu.prepare_write_payload().max(1);

        if value.is_empty() {
            return chr.write(&WriteRequest {
                conn: self.conn,
                offset: 0,
                value,
            });
        }

        for (i, fragment) in value.chunks(chunk).enumerate() {
            let offset = i.saturating_mul(chunk);
            trace!(conn=%self.conn, offset, len=fragment.len(), "Prepare write");

            chr.write(&WriteRequest {
                conn: self.conn,
                offset,
                value: fragment,
            })?;
        }

        Ok(())
    }

    /// Read the whole value with a Read followed by Read Blob requests until
    /// a short response arrives.
    pub fn read_long(&self, chr: &Characteristic) -> Result<Vec<u8>, AttError> {
        let payload = self.mtu.read_payload();
        let mut value = Vec::new();

        loop {
            let part = chr.read(&ReadRequest {
                conn: self.conn,
                offset: value.len(),
                mtu: self.mtu,
            })?;

            trace!(conn=%self.conn, offset=value.len(), len=part.len(), "Read blob");

            let done = part.len() < payload;
            value.extend_from_slice(&part);

            if done {
                return Ok(value);
            }
        }
    }
}
