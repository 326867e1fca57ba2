//! NV-CONTROL request surface
//!
//! One method per extension request. [`super::wire::XNvControl`] speaks the
//! real protocol; tests substitute a recording mock.

use super::events::{NotifyKind, NvControlEvent};
use crate::domain::{ProtocolVersion, Target, TargetType, ValidValues};
use crate::error::CtrlResult;

/// Minor opcodes of the extension requests in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    QueryExtension = 0,
    IsNv = 1,
    QueryAttribute = 2,
    QueryStringAttribute = 4,
    QueryValidAttributeValues = 5,
    SelectNotify = 6,
    SetStringAttribute = 9,
    SetAttributeAndGetStatus = 19,
    QueryBinaryData = 20,
    SelectTargetNotify = 23,
    QueryTargetCount = 24,
    StringOperation = 25,
    QueryValidAttributeValues64 = 26,
    QueryAttribute64 = 27,
    QueryValidStringAttributeValues = 28,
}

/// Requests understood by an NV-CONTROL server
///
/// Display-scoped calls carry a `display_mask`; 0 means the attribute is
/// not scoped to a display device.
pub trait NvControlProtocol {
    /// Protocol version reported by the server
    fn query_version(&self) -> CtrlResult<ProtocolVersion>;

    /// Whether X screen `screen` is driven by an NVIDIA GPU
    fn is_nv(&self, screen: u32) -> CtrlResult<bool>;

    fn select_notify(&self, screen: u32, kind: NotifyKind, enable: bool) -> CtrlResult<()>;

    fn select_target_notify(&self, target: Target, kind: NotifyKind, enable: bool)
        -> CtrlResult<()>;

    fn query_target_count(&self, kind: TargetType) -> CtrlResult<u32>;

    fn query_attribute(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<i32>;

    fn query_attribute64(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<i64>;

    /// Returns the server's success flag
    fn set_attribute_and_get_status(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
        value: i32,
    ) -> CtrlResult<bool>;

    fn query_valid_values(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues>;

    fn query_valid_values64(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues>;

    fn query_valid_string_values(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
    ) -> CtrlResult<ValidValues>;

    fn query_string(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<String>;

    /// Returns the server's success flag
    fn set_string(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
        value: &str,
    ) -> CtrlResult<bool>;

    fn query_binary(&self, target: Target, display_mask: u32, attr: u32) -> CtrlResult<Vec<u8>>;

    fn string_operation(
        &self,
        target: Target,
        display_mask: u32,
        attr: u32,
        input: &str,
    ) -> CtrlResult<String>;

    /// Block until the next NV-CONTROL event; `None` once the stream ends
    fn next_event(&self) -> CtrlResult<Option<NvControlEvent>>;
}
