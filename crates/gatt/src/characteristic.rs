use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use gatt_attest_primitives::uuid::Uuid;
use tracing::debug;

use crate::att::{AttError, ConnId, Mtu};

bitflags! {
    /// Characteristic properties, as carried in the declaration attribute.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Property: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub uuid: Uuid,
    pub value: Vec<u8>,
}

impl Descriptor {
    #[must_use]
    pub fn new(uuid: Uuid, value: impl Into<Vec<u8>>) -> Self {
        Self {
            uuid,
            value: value.into(),
        }
    }
}

/// A Read or Read Blob request.
#[derive(Clone, Copy, Debug)]
pub struct ReadRequest {
    pub conn: ConnId,
    pub offset: usize,
    pub mtu: Mtu,
}

/// A Write, or one Prepare Write fragment of a long write.
#[derive(Clone, Copy, Debug)]
pub struct WriteRequest<'a> {
    pub conn: ConnId,
    pub offset: usize,
    pub value: &'a [u8],
}

pub trait ReadHandler: Send + Sync {
    /// Return the value starting at `req.offset`. Anything beyond one read
    /// payload is dropped by the caller.
    fn serve_read(&self, req: &ReadRequest) -> Result<Vec<u8>, AttError>;
}

pub trait WriteHandler: Send + Sync {
    fn serve_write(&self, req: &WriteRequest<'_>) -> Result<(), AttError>;
}

impl<F> ReadHandler for F
where
    F: Fn(&ReadRequest) -> Result<Vec<u8>, AttError> + Send + Sync,
{
    fn serve_read(&self, req: &ReadRequest) -> Result<Vec<u8>, AttError> {
        self(req)
    }
}

impl<F> WriteHandler for F
where
    F: Fn(&WriteRequest<'_>) -> Result<(), AttError> + Send + Sync,
{
    fn serve_write(&self, req: &WriteRequest<'_>) -> Result<(), AttError> {
        self(req)
    }
}

/// Handle for a characteristic, ready to be attached to a service.
///
/// Registering a handler also sets the matching property bit.
#[derive(Clone)]
pub struct Characteristic {
    uuid: Uuid,
    properties: Property,
    descriptors: Vec<Descriptor>,
    read_handler: Option<Arc<dyn ReadHandler>>,
    write_handler: Option<Arc<dyn WriteHandler>>,
}

impl Characteristic {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            properties: Property::empty(),
            descriptors: Vec::new(),
            read_handler: None,
            write_handler: None,
        }
    }

    #[must_use]
    pub fn handle_read<H: ReadHandler + 'static>(mut self, handler: H) -> Self {
        self.properties |= Property::READ;
        self.read_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn handle_write<H: WriteHandler + 'static>(mut self, handler: H) -> Self {
        self.properties |= Property::WRITE;
        self.write_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    #[must_use]
    pub const fn properties(&self) -> Property {
        self.properties
    }

    #[must_use]
    pub fn descriptor(&self, uuid: Uuid) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.uuid == uuid)
    }

    /// Dispatch a Read or Read Blob request.
    pub fn read(&self, req: &ReadRequest) -> Result<Vec<u8>, AttError> {
        let handler = self
            .read_handler
            .as_ref()
            .filter(|_| self.properties.contains(Property::READ))
            .ok_or(AttError::ReadNotPermitted)?;

        let mut value = handler.serve_read(req)?;
        value.truncate(req.mtu.read_payload());

        debug!(conn=%req.conn, uuid=%self.uuid, offset=req.offset, len=value.len(), "Served read");

        Ok(value)
    }

    /// Dispatch a Write or Prepare Write fragment.
    pub fn write(&self, req: &WriteRequest<'_>) -> Result<(), AttError> {
        let handler = self
            .write_handler
            .as_ref()
            .filter(|_| self.properties.contains(Property::WRITE))
            .ok_or(AttError::WriteNotPermitted)?;

        handler.serve_write(req)?;

        debug!(conn=%req.conn, uuid=%self.uuid, offset=req.offset, len=req.value.len(), "Accepted write");

        Ok(())
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("uuid", &self.uuid)
            .field("properties", &self.properties)
            .field("descriptors", &self.descriptors)
            .field("read_handler", &self.read_handler.is_some())
            .field("write_handler", &self.write_handler.is_some())
            .finish()
    }
}
