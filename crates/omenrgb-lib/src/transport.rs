//! Firmware call seam — the one thing the query channel needs from the platform.
//!
//! A transport takes a GUID, a method id and an input buffer and hands back
//! whatever object the firmware produced. Interpreting that object is the
//! query channel's job.

use std::fmt;

/// Typed object returned by a firmware method call.
///
/// Only [`WmiReply::Buffer`] is a valid reply for the BIOS query method; the
/// other shapes exist so a misbehaving firmware can be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmiReply {
    Buffer(Vec<u8>),
    Integer(u64),
    String(String),
}

impl WmiReply {
    /// Short name of the object type, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            WmiReply::Buffer(_) => "buffer",
            WmiReply::Integer(_) => "integer",
            WmiReply::String(_) => "string",
        }
    }
}

/// The firmware call mechanism itself failed (method missing, evaluation
/// error, I/O on the underlying channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "firmware call failed: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Platform firmware call.
///
/// `Ok(None)` means the call succeeded but produced no object.
pub trait WmiTransport: Send + Sync {
    fn evaluate(
        &self,
        guid: &str,
        method_id: u32,
        input: &[u8],
    ) -> Result<Option<WmiReply>, TransportError>;
}

impl<T: WmiTransport + ?Sized> WmiTransport for std::sync::Arc<T> {
    fn evaluate(
        &self,
        guid: &str,
        method_id: u32,
        input: &[u8],
    ) -> Result<Option<WmiReply>, TransportError> {
        (**self).evaluate(guid, method_id, input)
    }
}

impl<T: WmiTransport + ?Sized> WmiTransport for &T {
    fn evaluate(
        &self,
        guid: &str,
        method_id: u32,
        input: &[u8],
    ) -> Result<Option<WmiReply>, TransportError> {
        (**self).evaluate(guid, method_id, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Fixed(Option<WmiReply>);

    impl WmiTransport for Fixed {
        fn evaluate(
            &self,
            _guid: &str,
            _method_id: u32,
            _input: &[u8],
        ) -> Result<Option<WmiReply>, TransportError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn reply_kind_names() {
        assert_eq!(WmiReply::Buffer(vec![]).kind(), "buffer");
        assert_eq!(WmiReply::Integer(1).kind(), "integer");
        assert_eq!(WmiReply::String("x".into()).kind(), "string");
    }

    #[test]
    fn transport_error_display() {
        let e = TransportError("AE_NOT_FOUND".into());
        assert_eq!(e.to_string(), "firmware call failed: AE_NOT_FOUND");
    }

    #[test]
    fn arc_and_ref_forward_to_inner() {
        let inner = Arc::new(Fixed(Some(WmiReply::Integer(7))));
        let via_arc = inner.evaluate("g", 1, &[]).unwrap();
        let via_ref = (&*inner).evaluate("g", 1, &[]).unwrap();
        assert_eq!(via_arc, Some(WmiReply::Integer(7)));
        assert_eq!(via_ref, via_arc);
    }
}
