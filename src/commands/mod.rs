//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command over an
//! open [`CtrlSystem`].

pub mod assign;
pub mod color;
pub mod list;
pub mod query;
pub mod valid;
pub mod watch;

pub use assign::run_assign;
pub use color::run_color;
pub use list::run_list;
pub use query::run_query;
pub use valid::run_valid;
pub use watch::run_watch;

use crate::attributes::{AttributeKind, NamedAttribute};
use crate::domain::{Permissions, Target, ValidValues, ValueType};
use crate::error::{AppError, CtrlResult, Result};
use crate::handle::AttributeHandle;
use crate::system::CtrlSystem;

/// Resolve an attribute name through the session's registry
pub(crate) fn lookup_attribute(system: &CtrlSystem, name: &str) -> Result<NamedAttribute> {
    system
        .registry()
        .lookup(name)
        .ok_or_else(|| AppError::UnknownAttribute(name.to_string()))
}

/// Valid values of any attribute kind on one handle
pub(crate) fn valid_values_of(
    handle: &AttributeHandle,
    display_mask: u32,
    attr: NamedAttribute,
) -> CtrlResult<ValidValues> {
    let scope = handle.target().kind.permission();
    match attr.kind {
        AttributeKind::Integer => handle.valid_display_values(display_mask, attr.id),
        AttributeKind::String => handle.valid_string_display_values(display_mask, attr.id),
        AttributeKind::Binary => Ok(ValidValues::new(
            ValueType::Binary,
            Permissions::READ | scope,
        )),
        AttributeKind::StringOperation => Ok(ValidValues::new(
            ValueType::StringOperation,
            Permissions::READ_WRITE | scope,
        )),
    }
}

/// The handle for `target`, or the first one whose valid values apply to
/// its own target type
pub(crate) fn select_handle<'a>(
    system: &'a CtrlSystem,
    target: Option<Target>,
    display_mask: u32,
    attr: NamedAttribute,
) -> Result<&'a AttributeHandle> {
    if let Some(target) = target {
        return system.target(target);
    }

    system
        .handles()
        .find(|handle| {
            valid_values_of(handle, display_mask, attr).is_ok_and(|valid| {
                valid
                    .permissions
                    .intersects(handle.target().kind.permission())
            })
        })
        .ok_or_else(|| AppError::TargetNotFound(format!("no target accepts {}", attr.name)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ids;
    use crate::domain::TargetType;

    #[test]
    fn test_lookup_attribute_case_insensitive() {
        let (_, system) = testing::session();
        let attr = lookup_attribute(&system, "gpucoretemp").unwrap();
        assert_eq!(attr.id, ids::GPU_CORE_TEMPERATURE);
        assert!(matches!(
            lookup_attribute(&system, "NoSuchThing"),
            Err(AppError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn test_select_handle_explicit_and_default() {
        let (nv, system) = testing::session();
        let attr = lookup_attribute(&system, "GPUTargetFanSpeed").unwrap();
        let cooler = Target::new(TargetType::Cooler, 0);
        let fan_only = ValidValues::new(
            ValueType::Range { min: 0, max: 100 },
            Permissions::READ_WRITE | Permissions::COOLER,
        );
        nv.set_valid_values(Target::x_screen(0), attr.id, fan_only);
        nv.set_valid_values(Target::gpu(0), attr.id, fan_only);

        let handle = select_handle(&system, None, 0, attr).unwrap();
        assert_eq!(handle.target(), cooler);

        let handle = select_handle(&system, Some(Target::gpu(0)), 0, attr).unwrap();
        assert_eq!(handle.target(), Target::gpu(0));

        assert!(matches!(
            select_handle(&system, Some(Target::gpu(3)), 0, attr),
            Err(AppError::TargetNotFound(_))
        ));
    }
}
