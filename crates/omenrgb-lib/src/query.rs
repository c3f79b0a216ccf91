//! Firmware query channel — request framing, size-class selection, reply decoding.
//!
//! Stateless: every call builds a fresh request frame, hands it to the
//! transport and decodes whatever comes back. Serializing calls that must not
//! interleave is the caller's job (see [`crate::backlight`]).

use std::fmt;

use crate::protocol::*;
use crate::transport::{TransportError, WmiReply, WmiTransport};

// ── Error type ──

/// Firmware query errors.
///
/// `Transport`, `FirmwareRejected` and `MalformedReply` are I/O-class: the
/// request was well formed but the firmware side failed. The other variants
/// are caller mistakes. Nothing in this crate retries either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirmwareError {
    InvalidArgument(String),
    InvalidZone(usize),
    Transport(String),
    FirmwareRejected(u32),
    MalformedReply(String),
}

impl FirmwareError {
    /// True for failures on the firmware side of the call.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            FirmwareError::Transport(_)
                | FirmwareError::FirmwareRejected(_)
                | FirmwareError::MalformedReply(_)
        )
    }
}

impl fmt::Display for FirmwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FirmwareError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            FirmwareError::InvalidZone(z) => {
                write!(f, "Invalid zone: {z} (expected 0-{})", ZONE_COUNT - 1)
            }
            FirmwareError::Transport(e) => write!(f, "Firmware call failed: {e}"),
            FirmwareError::FirmwareRejected(code) => match return_code_name(*code) {
                Some(name) => write!(f, "Firmware rejected query: 0x{code:02X} ({name})"),
                None => write!(f, "Firmware rejected query: 0x{code:02X}"),
            },
            FirmwareError::MalformedReply(e) => write!(f, "Malformed firmware reply: {e}"),
        }
    }
}

impl std::error::Error for FirmwareError {}

impl From<TransportError> for FirmwareError {
    fn from(e: TransportError) -> Self {
        FirmwareError::Transport(e.0)
    }
}

pub type Result<T> = std::result::Result<T, FirmwareError>;

// ── Size classes ──

/// Maximum reply size bucket requested from the firmware.
///
/// The firmware takes a bucket rather than a byte count; the smallest bucket
/// that holds the expected reply is used. The discriminant is the method id
/// sent with the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SizeClass {
    Empty = 1,
    Bytes4 = 2,
    Bytes128 = 3,
    Bytes1024 = 4,
    Bytes4096 = 5,
}

impl SizeClass {
    /// Every class, smallest first.
    pub const ALL: [SizeClass; 5] = [
        SizeClass::Empty,
        SizeClass::Bytes4,
        SizeClass::Bytes128,
        SizeClass::Bytes1024,
        SizeClass::Bytes4096,
    ];

    /// Smallest class able to carry `out_size` reply bytes.
    pub fn for_output_size(out_size: usize) -> Result<Self> {
        SizeClass::ALL
            .into_iter()
            .find(|class| out_size <= class.capacity())
            .ok_or_else(|| {
                FirmwareError::InvalidArgument(format!(
                    "output size {out_size} exceeds largest size class ({MAX_PAYLOAD} bytes)"
                ))
            })
    }

    /// Inverse of [`SizeClass::method_id`].
    pub fn from_method_id(id: u32) -> Option<Self> {
        SizeClass::ALL.into_iter().find(|c| c.method_id() == id)
    }

    /// Method id passed to the firmware call.
    pub fn method_id(self) -> u32 {
        self as u32
    }

    /// Largest reply payload (after the header) this class allows.
    pub fn capacity(self) -> usize {
        match self {
            SizeClass::Empty => 0,
            SizeClass::Bytes4 => 4,
            SizeClass::Bytes128 => 128,
            SizeClass::Bytes1024 => 1024,
            SizeClass::Bytes4096 => MAX_PAYLOAD,
        }
    }
}

// ── Request ──

/// One logical firmware command. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    query: u32,
    command: u32,
    payload: Vec<u8>,
}

impl CommandRequest {
    pub fn new(query: u32, command: u32, payload: impl Into<Vec<u8>>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FirmwareError::InvalidArgument(format!(
                "input size {} exceeds {MAX_PAYLOAD} bytes",
                payload.len()
            )));
        }
        Ok(CommandRequest {
            query,
            command,
            payload,
        })
    }

    /// Serialize into the firmware request frame.
    ///
    /// Layout: `[signature][command][query][data_size][data...]`, the data
    /// area zero padded to at least [`REQUEST_MIN_DATA`] bytes. `data_size`
    /// carries the unpadded length.
    pub fn encode(&self) -> Vec<u8> {
        let data_len = self.payload.len().max(REQUEST_MIN_DATA);
        let mut frame = Vec::with_capacity(REQUEST_HEADER_SIZE + data_len);
        frame.extend_from_slice(&REQUEST_SIGNATURE.to_le_bytes());
        frame.extend_from_slice(&self.command.to_le_bytes());
        frame.extend_from_slice(&self.query.to_le_bytes());
        frame.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&self.payload);
        frame.resize(REQUEST_HEADER_SIZE + data_len, 0);
        frame
    }
}

// ── Response ──

/// Decoded firmware reply.
///
/// `payload` is present only when `status` is zero and output was requested;
/// it is then exactly `out_size` bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub status: u32,
    pub payload: Option<Vec<u8>>,
}

impl CommandResponse {
    /// Validate and decode a raw reply.
    ///
    /// A missing object, a non-buffer object or a buffer shorter than the
    /// reply header is `MalformedReply`. A reply payload shorter than
    /// `out_size` is zero filled; a longer one is truncated.
    pub fn decode(reply: Option<WmiReply>, out_size: usize) -> Result<Self> {
        let bytes = match reply {
            Some(WmiReply::Buffer(bytes)) => bytes,
            Some(other) => {
                return Err(FirmwareError::MalformedReply(format!(
                    "expected buffer, got {}",
                    other.kind()
                )));
            }
            None => {
                return Err(FirmwareError::MalformedReply("no reply object".into()));
            }
        };
        if bytes.len() < REPLY_HEADER_SIZE {
            return Err(FirmwareError::MalformedReply(format!(
                "reply too short: got {} bytes, need {REPLY_HEADER_SIZE}",
                bytes.len()
            )));
        }

        let status = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if status != RET_SUCCESS || out_size == 0 {
            return Ok(CommandResponse {
                status,
                payload: None,
            });
        }

        let body = &bytes[REPLY_HEADER_SIZE..];
        let copied = out_size.min(body.len());
        let mut payload = vec![0u8; out_size];
        payload[..copied].copy_from_slice(&body[..copied]);
        Ok(CommandResponse {
            status,
            payload: Some(payload),
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == RET_SUCCESS
    }
}

// ── Channel ──

/// Issues framed BIOS queries over a [`WmiTransport`].
pub struct QueryChannel<T> {
    transport: T,
}

impl<T: WmiTransport> QueryChannel<T> {
    pub fn new(transport: T) -> Self {
        QueryChannel { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request` and decode the reply, expecting `out_size` payload bytes.
    ///
    /// A non-zero firmware status is returned as `FirmwareRejected`.
    pub fn execute(&self, request: &CommandRequest, out_size: usize) -> Result<CommandResponse> {
        let class = SizeClass::for_output_size(out_size)?;
        let frame = request.encode();
        log::debug!(
            "BIOS query 0x{:02X} cmd 0x{:05X}: {} bytes in, {out_size} out ({class:?})",
            request.query,
            request.command,
            request.payload.len()
        );

        let reply = self
            .transport
            .evaluate(BIOS_GUID, class.method_id(), &frame)?;
        let response = CommandResponse::decode(reply, out_size)?;
        if !response.is_success() {
            log::debug!(
                "BIOS query 0x{:02X} rejected with 0x{:02X}",
                request.query,
                response.status
            );
            return Err(FirmwareError::FirmwareRejected(response.status));
        }
        Ok(response)
    }

    /// Buffer-oriented query: send `buffer[..in_size]`, and on success
    /// overwrite `buffer[..out_size]` with the reply (zero filled where the
    /// reply is short). On failure `buffer` is left untouched.
    pub fn perform_query(
        &self,
        query: u32,
        command: u32,
        buffer: &mut [u8],
        in_size: usize,
        out_size: usize,
    ) -> Result<()> {
        if in_size > buffer.len() || out_size > buffer.len() {
            return Err(FirmwareError::InvalidArgument(format!(
                "buffer of {} bytes cannot carry {in_size} in / {out_size} out",
                buffer.len()
            )));
        }
        let request = CommandRequest::new(query, command, &buffer[..in_size])?;
        let response = self.execute(&request, out_size)?;
        if let Some(payload) = response.payload {
            buffer[..out_size].copy_from_slice(&payload);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Transport that returns a canned reply and records every call.
    struct Scripted {
        reply: std::result::Result<Option<WmiReply>, TransportError>,
        calls: Mutex<Vec<(String, u32, Vec<u8>)>>,
    }

    impl Scripted {
        fn replying(reply: Option<WmiReply>) -> Self {
            Scripted {
                reply: Ok(reply),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn buffer(status: u32, body: &[u8]) -> Self {
            let mut bytes = vec![0u8; 4];
            bytes.extend_from_slice(&status.to_le_bytes());
            bytes.extend_from_slice(body);
            Self::replying(Some(WmiReply::Buffer(bytes)))
        }
    }

    impl WmiTransport for Scripted {
        fn evaluate(
            &self,
            guid: &str,
            method_id: u32,
            input: &[u8],
        ) -> std::result::Result<Option<WmiReply>, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((guid.to_string(), method_id, input.to_vec()));
            self.reply.clone()
        }
    }

    // ── SizeClass ──

    #[test]
    fn size_class_boundaries() {
        assert_eq!(SizeClass::for_output_size(0).unwrap(), SizeClass::Empty);
        assert_eq!(SizeClass::for_output_size(1).unwrap(), SizeClass::Bytes4);
        assert_eq!(SizeClass::for_output_size(4).unwrap(), SizeClass::Bytes4);
        assert_eq!(SizeClass::for_output_size(5).unwrap(), SizeClass::Bytes128);
        assert_eq!(SizeClass::for_output_size(128).unwrap(), SizeClass::Bytes128);
        assert_eq!(SizeClass::for_output_size(129).unwrap(), SizeClass::Bytes1024);
        assert_eq!(SizeClass::for_output_size(1024).unwrap(), SizeClass::Bytes1024);
        assert_eq!(SizeClass::for_output_size(1025).unwrap(), SizeClass::Bytes4096);
        assert_eq!(SizeClass::for_output_size(4096).unwrap(), SizeClass::Bytes4096);
    }

    #[test]
    fn size_class_method_ids() {
        let ids: Vec<u32> = SizeClass::ALL.iter().map(|c| c.method_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn size_class_is_monotonic() {
        let mut prev = SizeClass::Empty;
        for n in 0..=MAX_PAYLOAD {
            let class = SizeClass::for_output_size(n).unwrap();
            assert!(class >= prev, "class dropped at {n}");
            assert!(class.capacity() >= n, "class too small at {n}");
            prev = class;
        }
    }

    #[test]
    fn size_class_rejects_oversize() {
        let err = SizeClass::for_output_size(4097).unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidArgument(_)));
        assert!(!err.is_io());
    }

    #[test]
    fn size_class_from_method_id() {
        assert_eq!(SizeClass::from_method_id(3), Some(SizeClass::Bytes128));
        assert_eq!(SizeClass::from_method_id(0), None);
        assert_eq!(SizeClass::from_method_id(6), None);
    }

    // ── CommandRequest ──

    #[test]
    fn encode_header_order() {
        let req = CommandRequest::new(QUERY_COLOR_GET, CMD_BACKLIGHT, vec![0xAA, 0xBB]).unwrap();
        let frame = req.encode();
        assert_eq!(&frame[0..4], &REQUEST_SIGNATURE.to_le_bytes());
        assert_eq!(&frame[4..8], &CMD_BACKLIGHT.to_le_bytes());
        assert_eq!(&frame[8..12], &QUERY_COLOR_GET.to_le_bytes());
        assert_eq!(&frame[12..16], &2u32.to_le_bytes());
        assert_eq!(&frame[16..18], &[0xAA, 0xBB]);
    }

    #[test]
    fn encode_pads_data_to_minimum() {
        let req = CommandRequest::new(QUERY_BRIGHTNESS_SET, CMD_BACKLIGHT, vec![0xE4]).unwrap();
        let frame = req.encode();
        assert_eq!(frame.len(), REQUEST_HEADER_SIZE + REQUEST_MIN_DATA);
        assert!(frame[17..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_large_payload_not_truncated() {
        let req = CommandRequest::new(1, 2, vec![7u8; 300]).unwrap();
        let frame = req.encode();
        assert_eq!(frame.len(), REQUEST_HEADER_SIZE + 300);
        assert_eq!(&frame[12..16], &300u32.to_le_bytes());
    }

    #[test]
    fn request_rejects_oversize_payload() {
        let err = CommandRequest::new(1, 2, vec![0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidArgument(_)));
    }

    // ── CommandResponse::decode ──

    #[test]
    fn decode_none_is_malformed() {
        let err = CommandResponse::decode(None, 4).unwrap_err();
        assert!(matches!(err, FirmwareError::MalformedReply(_)));
    }

    #[test]
    fn decode_non_buffer_is_malformed() {
        let err = CommandResponse::decode(Some(WmiReply::Integer(0)), 4).unwrap_err();
        assert_eq!(
            err,
            FirmwareError::MalformedReply("expected buffer, got integer".into())
        );
    }

    #[test]
    fn decode_short_buffer_is_malformed() {
        let err = CommandResponse::decode(Some(WmiReply::Buffer(vec![0; 7])), 0).unwrap_err();
        assert!(matches!(err, FirmwareError::MalformedReply(_)));
    }

    #[test]
    fn decode_nonzero_status_has_no_payload() {
        let mut bytes = vec![0u8; 12];
        bytes[4..8].copy_from_slice(&5u32.to_le_bytes());
        bytes[8..].copy_from_slice(&[1, 2, 3, 4]);
        let resp = CommandResponse::decode(Some(WmiReply::Buffer(bytes)), 4).unwrap();
        assert_eq!(resp.status, 5);
        assert!(resp.payload.is_none());
        assert!(!resp.is_success());
    }

    #[test]
    fn decode_zero_fills_short_reply() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[9, 8]);
        let resp = CommandResponse::decode(Some(WmiReply::Buffer(bytes)), 5).unwrap();
        assert_eq!(resp.payload, Some(vec![9, 8, 0, 0, 0]));
    }

    #[test]
    fn decode_truncates_long_reply() {
        let mut bytes = vec![0u8; 8];
        bytes.extend_from_slice(&[1, 2, 3, 4]);
        let resp = CommandResponse::decode(Some(WmiReply::Buffer(bytes)), 1).unwrap();
        assert_eq!(resp.payload, Some(vec![1]));
    }

    #[test]
    fn decode_no_output_requested() {
        let bytes = vec![0u8; 12];
        let resp = CommandResponse::decode(Some(WmiReply::Buffer(bytes)), 0).unwrap();
        assert!(resp.is_success());
        assert!(resp.payload.is_none());
    }

    // ── QueryChannel ──

    #[test]
    fn perform_query_sends_frame_with_size_class() {
        let channel = QueryChannel::new(Scripted::buffer(0, &[0x11; 4]));
        let mut buf = [0x42u8; 2];
        channel
            .perform_query(QUERY_BRIGHTNESS_GET, CMD_BACKLIGHT, &mut buf, 1, 1)
            .unwrap();

        let calls = channel.transport().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (guid, method_id, frame) = &calls[0];
        assert_eq!(guid, BIOS_GUID);
        assert_eq!(*method_id, SizeClass::Bytes4.method_id());
        assert_eq!(&frame[12..16], &1u32.to_le_bytes());
        assert_eq!(frame[16], 0x42);
        // Only out_size bytes are overwritten.
        assert_eq!(buf, [0x11, 0x42]);
    }

    #[test]
    fn perform_query_zero_fills_requested_bytes() {
        let channel = QueryChannel::new(Scripted::buffer(0, &[0xAB]));
        let mut buf = [0xFFu8; 4];
        channel.perform_query(1, 2, &mut buf, 0, 4).unwrap();
        assert_eq!(buf, [0xAB, 0, 0, 0]);
    }

    #[test]
    fn perform_query_rejected_leaves_buffer() {
        let channel = QueryChannel::new(Scripted::buffer(RET_UNKNOWN_COMMAND, &[0xAB; 4]));
        let mut buf = [0x55u8; 4];
        let err = channel.perform_query(1, 2, &mut buf, 4, 4).unwrap_err();
        assert_eq!(err, FirmwareError::FirmwareRejected(RET_UNKNOWN_COMMAND));
        assert!(err.is_io());
        assert_eq!(buf, [0x55; 4]);
    }

    #[test]
    fn perform_query_transport_failure() {
        let transport = Scripted {
            reply: Err(TransportError("AE_ERROR".into())),
            calls: Mutex::new(Vec::new()),
        };
        let channel = QueryChannel::new(transport);
        let mut buf = [0u8; 4];
        let err = channel.perform_query(1, 2, &mut buf, 4, 4).unwrap_err();
        assert_eq!(err, FirmwareError::Transport("AE_ERROR".into()));
    }

    #[test]
    fn perform_query_malformed_leaves_buffer() {
        let channel = QueryChannel::new(Scripted::replying(Some(WmiReply::String("x".into()))));
        let mut buf = [0x77u8; 4];
        let err = channel.perform_query(1, 2, &mut buf, 4, 4).unwrap_err();
        assert!(matches!(err, FirmwareError::MalformedReply(_)));
        assert_eq!(buf, [0x77; 4]);
    }

    #[test]
    fn perform_query_sizes_must_fit_buffer() {
        let channel = QueryChannel::new(Scripted::buffer(0, &[]));
        let mut buf = [0u8; 4];
        assert!(matches!(
            channel.perform_query(1, 2, &mut buf, 5, 0),
            Err(FirmwareError::InvalidArgument(_))
        ));
        assert!(matches!(
            channel.perform_query(1, 2, &mut buf, 0, 5),
            Err(FirmwareError::InvalidArgument(_))
        ));
        assert!(channel.transport().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn perform_query_oversize_output_never_calls_firmware() {
        let channel = QueryChannel::new(Scripted::buffer(0, &[]));
        let mut buf = vec![0u8; MAX_PAYLOAD + 1];
        let err = channel
            .perform_query(1, 2, &mut buf, 0, MAX_PAYLOAD + 1)
            .unwrap_err();
        assert!(matches!(err, FirmwareError::InvalidArgument(_)));
        assert!(channel.transport().calls.lock().unwrap().is_empty());
    }

    // ── Display ──

    #[test]
    fn display_rejected_known_code() {
        let e = FirmwareError::FirmwareRejected(RET_INVALID_PARAMETERS);
        assert_eq!(
            e.to_string(),
            "Firmware rejected query: 0x05 (invalid parameters)"
        );
    }

    #[test]
    fn display_rejected_unknown_code() {
        let e = FirmwareError::FirmwareRejected(0x1234);
        assert_eq!(e.to_string(), "Firmware rejected query: 0x1234");
    }

    #[test]
    fn display_invalid_zone() {
        assert_eq!(
            FirmwareError::InvalidZone(7).to_string(),
            "Invalid zone: 7 (expected 0-3)"
        );
    }

    #[test]
    fn from_transport_error() {
        let e: FirmwareError = TransportError("gone".into()).into();
        assert_eq!(e, FirmwareError::Transport("gone".into()));
    }
}
