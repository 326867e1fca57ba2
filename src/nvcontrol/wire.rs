//! NV-CONTROL over the X connection
//!
//! x11rb has no binding for this extension, so requests are encoded by hand
//! and sent as raw extension requests. All multi-byte fields use the
//! client's byte order, as the server swaps for foreign clients.

use super::events::{NotifyKind, NvControlEvent};
use super::protocol::{NvControlProtocol, Opcode};
use crate::domain::{Permissions, ProtocolVersion, Target, TargetType, ValidValues, ValueType};
use crate::error::{CtrlError, CtrlResult};
use crate::xext::XDisplay;

use std::io::IoSlice;
use std::rc::Rc;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::ParseError;
use x11rb::protocol::Event;
use x11rb::x11_utils::TryParse;

pub const EXTENSION_NAME: &str = "NV-CONTROL";

/// Offset of the variable-length payload in string and binary replies
const DATA_OFFSET: usize = 32;

/// Build a complete request: 4-byte header, body, padding to 4 bytes
pub(crate) fn encode_request(major_opcode: u8, opcode: Opcode, body: &[u8]) -> Vec<u8> {
    let padded = (body.len() + 3) & !3;
    let total = 4 + padded;
    let mut buf = Vec::with_capacity(total);
    buf.push(major_opcode);
    buf.push(opcode as u8);
    buf.extend_from_slice(&((total / 4) as u16).to_ne_bytes());
    buf.extend_from_slice(body);
    buf.resize(total, 0);
    buf
}

/// `target_id, target_type, display_mask, attribute`
pub(crate) fn attribute_body(target: Target, display_mask: u32, attr: u32) -> Vec<u8> {
    let mut body = Vec::with_capacity(12);
    body.extend_from_slice(&(target.id as u16).to_ne_bytes());
    body.extend_from_slice(&target.kind.as_raw().to_ne_bytes());
    body.extend_from_slice(&display_mask.to_ne_bytes());
    body.extend_from_slice(&attr.to_ne_bytes());
    body
}

/// Attribute body followed by a NUL-terminated string
pub(crate) fn string_body(target: Target, display_mask: u32, attr: u32, value: &str) -> Vec<u8> {
    let mut body = attribute_body(target, display_mask, attr);
    let len = value.len() as u32 + 1;
    body.extend_from_slice(&len.to_ne_bytes());
    body.extend_from_slice(value.as_bytes());
    body.push(0);
    body
}

fn field<T: TryParse>(reply: &[u8], offset: usize) -> Result<T, ParseError> {
    let bytes = reply.get(offset..).ok_or(ParseError::InsufficientData)?;
    Ok(T::try_parse(bytes)?.0)
}

fn rest(reply: &[u8]) -> &[u8] {
    &reply[reply.len()..]
}

struct VersionReply {
    major: u16,
    minor: u16,
}

impl TryParse for VersionReply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        let reply = VersionReply {
            major: field(value, 8)?,
            minor: field(value, 10)?,
        };
        Ok((reply, rest(value)))
    }
}

/// Replies carrying a single 32-bit word at offset 8
struct WordReply(u32);

impl TryParse for WordReply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        Ok((WordReply(field(value, 8)?), rest(value)))
    }
}

struct AttributeReply {
    flags: u32,
    value: i32,
}

impl TryParse for AttributeReply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        let reply = AttributeReply {
            flags: field(value, 8)?,
            value: field(value, 12)?,
        };
        Ok((reply, rest(value)))
    }
}

struct Attribute64Reply {
    flags: u32,
    value: i64,
}

impl TryParse for Attribute64Reply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        let reply = Attribute64Reply {
            flags: field(value, 8)?,
            value: field(value, 16)?,
        };
        Ok((reply, rest(value)))
    }
}

struct ValidValuesReply {
    flags: u32,
    values: ValidValues,
}

impl ValidValuesReply {
    fn parse32(value: &[u8]) -> Result<Self, ParseError> {
        let kind: u32 = field(value, 12)?;
        let min: i32 = field(value, 16)?;
        let max: i32 = field(value, 20)?;
        let bits: u32 = field(value, 24)?;
        let perms: u32 = field(value, 28)?;
        Ok(Self {
            flags: field(value, 8)?,
            values: ValidValues::new(
                ValueType::from_wire(kind, min.into(), max.into(), bits.into()),
                Permissions::from_bits_truncate(perms),
            ),
        })
    }

    fn parse64(value: &[u8]) -> Result<Self, ParseError> {
        let kind: u32 = field(value, 12)?;
        let min: i64 = field(value, 16)?;
        let max: i64 = field(value, 24)?;
        let bits: u64 = field(value, 32)?;
        let perms: u32 = field(value, 40)?;
        Ok(Self {
            flags: field(value, 8)?,
            values: ValidValues::new(
                ValueType::from_wire(kind, min, max, bits),
                Permissions::from_bits_truncate(perms),
            ),
        })
    }
}

struct ValidValues32Reply(ValidValuesReply);

impl TryParse for ValidValues32Reply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        Ok((Self(ValidValuesReply::parse32(value)?), rest(value)))
    }
}

struct ValidValues64Reply(ValidValuesReply);

impl TryParse for ValidValues64Reply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        Ok((Self(ValidValuesReply::parse64(value)?), rest(value)))
    }
}

/// `flags` (or return code) at 8, byte count at 12, payload at 32
struct DataReply {
    flags: u32,
    data: Vec<u8>,
}

impl TryParse for DataReply {
    fn try_parse(value: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        let flags = field(value, 8)?;
        let len: u32 = field(value, 12)?;
        let data = value
            .get(DATA_OFFSET..DATA_OFFSET + len as usize)
            .ok_or(ParseError::InsufficientData)?
            .to_vec();
        Ok((DataReply { flags, data }, rest(value)))
    }
}

/// Decode a NUL-terminated string payload
pub(crate) fn payload_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

fn available(flags: u32) -> CtrlResult<()> {
    if flags == 0 {
        Err(CtrlError::AttributeNotAvailable)
    } else {
        Ok(())
    }
}

/// NV-CONTROL client bound to an X connection
pub struct XNvControl {
    display: Rc<XDisplay>,
    major_opcode: u8,
    event_base: u8,
}

impl XNvControl {
    /// Look up the extension on the server
    ///
    /// Returns `MissingExtension` when the server does not advertise it.
    pub fn new(display: Rc<XDisplay>) -> CtrlResult<Self> {
        let info = display
            .conn()
            .extension_information(EXTENSION_NAME)?
            .ok_or(CtrlError::MissingExtension)?;
        log::debug!(
            "{} major opcode {}, first event {}",
            EXTENSION_NAME,
            info.major_opcode,
            info.first_event
        );
        Ok(Self {
            display,
            major_opcode: info.major_opcode,
            event_base: info.first_event,
        })
    }

    pub fn event_base(&self) -> u8 {
        self.event_base
    }

    fn request<R: TryParse>(&self, opcode: Opcode, body: &[u8]) -> CtrlResult<R> {
        let buf = encode_request(self.major_opcode, opcode, body);
        let cookie = self
            .display
            .conn()
            .send_request_with_reply::<R>(&[IoSlice::new(&buf)], Vec::new())?;
        Ok(cookie.reply()?)
    }

    fn send(&self, opcode: Opcode, body: &[u8]) -> CtrlResult<()> {
        let buf = encode_request(self.major_opcode, opcode, body);
        self.display
            .conn()
            .send_request_without_reply(&[IoSlice::new(&buf)], Vec::new())?
            .check()?;
        Ok(())
    }
}

impl NvControlProtocol for XNvControl {
    fn query_version(&self) -> CtrlResult<ProtocolVersion> {
        let reply: VersionReply = self.request(Opcode::QueryExtension, &[])?;
        Ok(ProtocolVersion::new(reply.major.into(), reply.minor.into()))
    }

    fn is_nv(&self, screen: u32) -> CtrlResult<bool> {
        let reply: WordReply = self.request(Opcode::IsNv, &screen.to_ne_bytes())?;
        Ok(reply.0 != 0)
    }

    fn select_notify(&self, screen: u32, kind: NotifyKind, enable: bool) -> CtrlResult<()> {
        let mut body = Vec::with_capacity(8);
        body.extend_from_slice(&screen.to_ne_bytes());
        body.extend_from_slice(&kind.as_raw().to_ne_bytes());
        body.extend_from_slice(&u16::from(enable).to_ne_bytes());
        self.send(Opcode::SelectNotify, &body)
    }

    fn select_target_notify(
        &self,
        target: Target,
        kind: NotifyKind,
        enable: bool,
    ) -> CtrlResult<()> {
        let mut body = Vec::with_capacity(12);
        body.extend_from_slice(&(target.id as u16).to_ne_bytes());
        body.extend_from_slice(&target.kind.as_raw().to_ne_bytes());
        body.extend_from_slice(&u32::from(kind.as_raw()).to_ne_bytes());
        body.extend_from_slice(&u32::from(enable).to_ne_bytes());
        self.send(Opcode::SelectTargetNotify, &body)
    }

    fn query_target_count(&self, kind: TargetType) -> CtrlResult<u32> {
        let body = u32::from(kind.as_raw()).to_ne_bytes();
        let reply: WordReply = self.request(Opcode::QueryTargetCount, &body)?;
        Ok(reply.0)
    }

    fn query_attribute(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<i32> {
        let body = attribute_body(target, display_mask, attr);
        let reply: AttributeReply = self.request(Opcode::QueryAttribute, &body)?;
        available(reply.flags)?;
        Ok(reply.value)
    }

    fn query_attribute64(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<i64> {
        let body = attribute_body(target, display_mask, attr);
        let reply: Attribute64Reply = self.request(Opcode::QueryAttribute64, &body)?;
        available(reply.flags)?;
        Ok(reply.value)
    }

    fn set_attribute_and_get_status(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
        value: i32,
    ) -> CtrlResult<bool> {
        let mut body = attribute_body(target, display_mask, attr);
        body.extend_from_slice(&value.to_ne_bytes());
        let reply: WordReply = self.request(Opcode::SetAttributeAndGetStatus, &body)?;
        Ok(reply.0 != 0)
    }

    fn query_valid_values(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        let body = attribute_body(target, display_mask, attr);
        let ValidValues32Reply(reply) = self.request(Opcode::QueryValidAttributeValues, &body)?;
        available(reply.flags)?;
        Ok(reply.values)
    }

    fn query_valid_values64(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        let body = attribute_body(target, display_mask, attr);
        let ValidValues64Reply(reply) =
            self.request(Opcode::QueryValidAttributeValues64, &body)?;
        available(reply.flags)?;
        Ok(reply.values)
    }

    fn query_valid_string_values(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues> {
        let body = attribute_body(target, display_mask, attr);
        let ValidValues32Reply(reply) =
            self.request(Opcode::QueryValidStringAttributeValues, &body)?;
        available(reply.flags)?;
        Ok(reply.values)
    }

    fn query_string(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<String> {
        let body = attribute_body(target, display_mask, attr);
        let reply: DataReply = self.request(Opcode::QueryStringAttribute, &body)?;
        available(reply.flags)?;
        Ok(payload_string(&reply.data))
    }

    fn set_string(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
        value: &str,
    ) -> CtrlResult<bool> {
        let body = string_body(target, display_mask, attr, value);
        let reply: WordReply = self.request(Opcode::SetStringAttribute, &body)?;
        Ok(reply.0 != 0)
    }

    fn query_binary(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<Vec<u8>> {
        let body = attribute_body(target, display_mask, attr);
        let reply: DataReply = self.request(Opcode::QueryBinaryData, &body)?;
        available(reply.flags)?;
        Ok(reply.data)
    }

    fn string_operation(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
        input: &str,
    ) -> CtrlResult<String> {
        let body = string_body(target, display_mask, attr, input);
        let reply: DataReply = self.request(Opcode::StringOperation, &body)?;
        available(reply.flags)?;
        Ok(payload_string(&reply.data))
    }

    fn next_event(&self) -> CtrlResult<Option<NvControlEvent>> {
        loop {
            match self.display.conn().wait_for_event()? {
                Event::Unknown(raw) => {
                    if let Some(event) = NvControlEvent::parse(&raw, self.event_base) {
                        return Ok(Some(event));
                    }
                }
                other => log::trace!("Ignoring X event {:?}", other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ids;

    #[test]
    fn test_encode_query_attribute() {
        let body = attribute_body(Target::gpu(3), 0x10, ids::GPU_CORE_TEMPERATURE);
        let req = encode_request(140, Opcode::QueryAttribute, &body);
        assert_eq!(req.len(), 16);
        assert_eq!(req[0], 140);
        assert_eq!(req[1], 2);
        assert_eq!(u16::from_ne_bytes([req[2], req[3]]), 4);
        assert_eq!(u16::from_ne_bytes([req[4], req[5]]), 3);
        assert_eq!(u16::from_ne_bytes([req[6], req[7]]), 1);
        assert_eq!(u32::from_ne_bytes(req[8..12].try_into().unwrap()), 0x10);
        assert_eq!(
            u32::from_ne_bytes(req[12..16].try_into().unwrap()),
            ids::GPU_CORE_TEMPERATURE
        );
    }

    #[test]
    fn test_encode_string_is_padded() {
        let body = string_body(Target::x_screen(0), 0, 7, "abc");
        assert_eq!(body.len(), 12 + 4 + 4);
        let req = encode_request(1, Opcode::SetStringAttribute, &body);
        assert_eq!(req.len() % 4, 0);
        assert_eq!(u16::from_ne_bytes([req[2], req[3]]) as usize * 4, req.len());
        assert_eq!(&req[20..24], b"abc\0");

        let body = string_body(Target::x_screen(0), 0, 7, "abcd");
        let req = encode_request(1, Opcode::StringOperation, &body);
        assert_eq!(req.len(), 4 + 16 + 8);
        assert_eq!(req[1], 25);
    }

    fn reply_with(len: usize, fields: &[(usize, &[u8])]) -> Vec<u8> {
        let mut reply = vec![0u8; len];
        reply[0] = 1;
        for (offset, bytes) in fields {
            reply[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        reply
    }

    #[test]
    fn test_parse_attribute_replies() {
        let reply = reply_with(32, &[(8, &1u32.to_ne_bytes()), (12, &(-7i32).to_ne_bytes())]);
        let parsed = AttributeReply::try_parse(&reply).unwrap().0;
        assert_eq!(parsed.flags, 1);
        assert_eq!(parsed.value, -7);

        let big = 1i64 << 40;
        let reply = reply_with(32, &[(8, &1u32.to_ne_bytes()), (16, &big.to_ne_bytes())]);
        let parsed = Attribute64Reply::try_parse(&reply).unwrap().0;
        assert_eq!(parsed.value, big);
    }

    #[test]
    fn test_parse_valid_values_reply() {
        let reply = reply_with(
            32,
            &[
                (8, &1u32.to_ne_bytes()),
                (12, &4u32.to_ne_bytes()),
                (16, &0i32.to_ne_bytes()),
                (20, &100i32.to_ne_bytes()),
                (28, &0x203u32.to_ne_bytes()),
            ],
        );
        let ValidValues32Reply(parsed) = ValidValues32Reply::try_parse(&reply).unwrap().0;
        assert_eq!(parsed.values.value_type, ValueType::Range { min: 0, max: 100 });
        assert!(parsed.values.permissions.writable());
        assert!(parsed.values.permissions.contains(Permissions::COOLER));

        let reply = reply_with(
            48,
            &[
                (8, &1u32.to_ne_bytes()),
                (12, &5u32.to_ne_bytes()),
                (32, &0b1010u64.to_ne_bytes()),
                (40, &1u32.to_ne_bytes()),
            ],
        );
        let ValidValues64Reply(parsed) = ValidValues64Reply::try_parse(&reply).unwrap().0;
        assert_eq!(parsed.values.value_type, ValueType::IntBits { bits: 0b1010 });
    }

    #[test]
    fn test_parse_data_reply() {
        let mut reply = reply_with(40, &[(8, &1u32.to_ne_bytes()), (12, &6u32.to_ne_bytes())]);
        reply[32..38].copy_from_slice(b"GA102\0");
        let parsed = DataReply::try_parse(&reply).unwrap().0;
        assert_eq!(payload_string(&parsed.data), "GA102");

        let short = reply_with(32, &[(12, &6u32.to_ne_bytes())]);
        assert!(DataReply::try_parse(&short).is_err());
    }

    #[test]
    fn test_unavailable_flag() {
        assert_eq!(available(0), Err(CtrlError::AttributeNotAvailable));
        assert_eq!(available(1), Ok(()));
    }
}
