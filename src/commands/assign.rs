//! Assign command implementation
//!
//! Writes an integer or string attribute, or runs a string operation.

use crate::attributes::{AttributeKind, NamedAttribute};
use crate::cli::args::{AssignArgs, OutputFormat};
use crate::cli::output::{print_output, AttributeReport, AttributeValue, Message};
use crate::commands::{lookup_attribute, select_handle};
use crate::error::{AppError, CtrlError, Result};
use crate::handle::AttributeHandle;
use crate::system::CtrlSystem;

/// Parse an integer value: decimal, `0x` hex, or a boolean word
pub fn parse_integer(value: &str) -> Result<i64> {
    let v = value.trim();
    let parsed = match v.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(1),
        "off" | "false" | "no" => Ok(0),
        lower => match lower.strip_prefix("0x") {
            Some(hex) => i64::from_str_radix(hex, 16),
            None => lower.parse(),
        },
    };
    parsed.map_err(|_| AppError::InvalidValue(format!("'{}' is not an integer", value)))
}

/// Apply `value` to `attr` on one handle
///
/// String operations report their output; other kinds echo the value
/// that was written.
pub fn write_attribute(
    handle: &AttributeHandle,
    display_mask: u32,
    attr: NamedAttribute,
    value: &str,
) -> Result<AttributeReport> {
    let written = match attr.kind {
        AttributeKind::Integer => {
            let v = parse_integer(value)?;
            handle.set_display_attribute(display_mask, attr.id, v)?;
            AttributeValue::Integer(v)
        }
        AttributeKind::String => {
            handle.set_string_display_attribute(display_mask, attr.id, value)?;
            AttributeValue::String(value.to_string())
        }
        AttributeKind::StringOperation => {
            AttributeValue::String(handle.string_operation(display_mask, attr.id, value)?)
        }
        AttributeKind::Binary => return Err(CtrlError::ReadOnlyAttribute.into()),
    };

    log::info!("{} on {} set to {}", attr.name, handle.target(), written);
    Ok(AttributeReport {
        target: handle.target().to_string(),
        attribute: attr.name.to_string(),
        kind: attr.kind,
        value: written,
    })
}

/// Execute the assign command
pub fn run_assign(
    system: &CtrlSystem,
    args: &AssignArgs,
    format: OutputFormat,
    dry_run: bool,
) -> Result<()> {
    let (name, value) = &args.assignment;
    let attr = lookup_attribute(system, name)?;
    let handle = select_handle(system, args.target, args.display_mask, attr)?;

    if dry_run {
        if attr.kind == AttributeKind::Integer {
            parse_integer(value)?;
        }
        let msg = Message {
            message: format!(
                "[DRY RUN] Would set {} on {} to {}",
                attr.name,
                handle.target(),
                value
            ),
            success: true,
        };
        print_output(&msg, format)?;
        return Ok(());
    }

    let report = write_attribute(handle, args.display_mask, attr, value)?;
    print_output(&report, format)?;
    Ok(())
}
