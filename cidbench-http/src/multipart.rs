use bytes::{BufMut as _, Bytes, BytesMut};
use rand::Rng as _;

/// A `multipart/form-data` body assembled in memory.
///
/// Parts are written in insertion order; the boundary is random per body.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    buf: BytesMut,
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

impl Multipart {
    pub fn new() -> Self {
        let token: u64 = rand::rng().random();
        Self::with_boundary(format!("cidbench-{token:016x}"))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buf: BytesMut::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` header of the request carrying this body.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    #[must_use]
    pub fn file(mut self, field: &str, filename: &str, contents: &[u8]) -> Self {
        self.buf.reserve(contents.len() + 160);
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"\r\n");
        self.buf.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        self.buf
            .put_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        self.buf.put_slice(contents);
        self.buf.put_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Bytes {
        self.buf.put_slice(b"--");
        self.buf.put_slice(self.boundary.as_bytes());
        self.buf.put_slice(b"--\r\n");
        self.buf.freeze()
    }
}
