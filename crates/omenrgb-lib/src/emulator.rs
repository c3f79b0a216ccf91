//! In-memory emulation of the BIOS side of the backlight query method.
//!
//! Decodes request frames the way the firmware does, answers the four
//! backlight queries from its own table and brightness byte, and replies with
//! a buffer sized by the requested size class. Used by the tests and as the
//! CLI's firmware backend.
//!
//! Fault injection (transport failures, forced return codes, forced reply
//! shapes, per-call latency) lets callers exercise every error path of the
//! query channel.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::protocol::*;
use crate::query::SizeClass;
use crate::table::ColorTable;
use crate::transport::{TransportError, WmiReply, WmiTransport};

/// One recorded firmware call, header fields decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub method_id: u32,
    pub command: u32,
    pub query: u32,
    pub data_size: u32,
}

#[derive(Debug)]
struct BiosState {
    table: ColorTable,
    brightness: u8,
    calls: Vec<CallRecord>,
    fail_next: usize,
    rejections: HashMap<u32, u32>,
    forced_reply: Option<WmiReply>,
    latency: Duration,
}

/// Emulated firmware. `Send + Sync`; share it behind an `Arc` or a reference.
#[derive(Debug)]
pub struct EmulatedBios {
    state: Mutex<BiosState>,
}

impl Default for EmulatedBios {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl EmulatedBios {
    /// Zeroed table, backlight on.
    pub fn new() -> Self {
        Self::with_state(ColorTable::zeroed(), BRIGHTNESS_ON)
    }

    pub fn with_state(table: ColorTable, brightness: u8) -> Self {
        EmulatedBios {
            state: Mutex::new(BiosState {
                table,
                brightness,
                calls: Vec::new(),
                fail_next: 0,
                rejections: HashMap::new(),
                forced_reply: None,
                latency: Duration::ZERO,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BiosState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Firmware-held state ──

    pub fn table(&self) -> ColorTable {
        self.state().table.clone()
    }

    pub fn set_table(&self, table: ColorTable) {
        self.state().table = table;
    }

    pub fn brightness_byte(&self) -> u8 {
        self.state().brightness
    }

    pub fn set_brightness_byte(&self, byte: u8) {
        self.state().brightness = byte;
    }

    // ── Call log ──

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    // ── Fault injection ──

    /// Fail the next `n` calls at transport level.
    pub fn fail_next(&self, n: usize) {
        self.state().fail_next = n;
    }

    /// Answer every call for `query` with the non-zero return code `code`.
    pub fn reject_query(&self, query: u32, code: u32) {
        self.state().rejections.insert(query, code);
    }

    /// Return `reply` verbatim for every call.
    pub fn force_reply(&self, reply: WmiReply) {
        self.state().forced_reply = Some(reply);
    }

    /// Sleep this long at the start of every call.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    pub fn clear_faults(&self) {
        let mut st = self.state();
        st.fail_next = 0;
        st.rejections.clear();
        st.forced_reply = None;
        st.latency = Duration::ZERO;
    }

    // ── Dispatch ──

    /// Execute one decoded request; returns `(return_code, payload)`.
    fn dispatch(st: &mut BiosState, input: &[u8]) -> (u32, Vec<u8>) {
        if input.len() < REQUEST_HEADER_SIZE {
            return (RET_INVALID_PARAMETERS, Vec::new());
        }
        let signature = read_u32(input, 0);
        let command = read_u32(input, 4);
        let query = read_u32(input, 8);
        let data_size = read_u32(input, 12) as usize;
        let data = &input[REQUEST_HEADER_SIZE..];

        if signature != REQUEST_SIGNATURE {
            return (RET_WRONG_SIGNATURE, Vec::new());
        }
        if command != CMD_BACKLIGHT {
            return (RET_UNKNOWN_COMMAND, Vec::new());
        }
        if let Some(&code) = st.rejections.get(&query) {
            return (code, Vec::new());
        }
        if data_size > data.len() {
            return (RET_INVALID_PARAMETERS, Vec::new());
        }

        match query {
            QUERY_COLOR_GET => (RET_SUCCESS, st.table.as_bytes().to_vec()),
            QUERY_COLOR_SET => match ColorTable::from_slice(&data[..data_size]) {
                Ok(table) => {
                    st.table = table;
                    (RET_SUCCESS, Vec::new())
                }
                Err(_) => (RET_INVALID_PARAMETERS, Vec::new()),
            },
            QUERY_BRIGHTNESS_GET => (RET_SUCCESS, vec![st.brightness]),
            QUERY_BRIGHTNESS_SET if data_size >= 1 => {
                st.brightness = data[0];
                (RET_SUCCESS, Vec::new())
            }
            QUERY_BRIGHTNESS_SET => (RET_INVALID_PARAMETERS, Vec::new()),
            _ => (RET_UNKNOWN_QUERY, Vec::new()),
        }
    }
}

impl WmiTransport for EmulatedBios {
    fn evaluate(
        &self,
        guid: &str,
        method_id: u32,
        input: &[u8],
    ) -> Result<Option<WmiReply>, TransportError> {
        // Sleep outside the lock so concurrent callers really interleave.
        let latency = self.state().latency;
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut st = self.state();
        let record = if input.len() >= REQUEST_HEADER_SIZE {
            CallRecord {
                method_id,
                command: read_u32(input, 4),
                query: read_u32(input, 8),
                data_size: read_u32(input, 12),
            }
        } else {
            CallRecord {
                method_id,
                command: 0,
                query: 0,
                data_size: 0,
            }
        };
        st.calls.push(record);

        if st.fail_next > 0 {
            st.fail_next -= 1;
            return Err(TransportError("injected transport failure".into()));
        }
        if !guid.eq_ignore_ascii_case(BIOS_GUID) {
            return Err(TransportError(format!("no method for GUID {guid}")));
        }
        let Some(class) = SizeClass::from_method_id(method_id) else {
            return Err(TransportError(format!("no method id {method_id}")));
        };
        if let Some(reply) = &st.forced_reply {
            return Ok(Some(reply.clone()));
        }

        let (code, mut payload) = Self::dispatch(&mut st, input);
        payload.resize(class.capacity(), 0);

        let mut reply = Vec::with_capacity(REPLY_HEADER_SIZE + payload.len());
        reply.extend_from_slice(&0u32.to_le_bytes());
        reply.extend_from_slice(&code.to_le_bytes());
        if code == RET_SUCCESS {
            reply.extend_from_slice(&payload);
        }
        Ok(Some(WmiReply::Buffer(reply)))
    }
}
