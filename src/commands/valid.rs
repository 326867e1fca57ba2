//! Valid command implementation

use crate::cli::args::{OutputFormat, ValidArgs};
use crate::cli::output::{print_output, ValidReport};
use crate::commands::{lookup_attribute, select_handle, valid_values_of};
use crate::error::Result;
use crate::system::CtrlSystem;

/// Describe the values `args.attribute` accepts
pub fn valid(system: &CtrlSystem, args: &ValidArgs) -> Result<ValidReport> {
    let attr = lookup_attribute(system, &args.attribute)?;
    let handle = select_handle(system, args.target, args.display_mask, attr)?;
    let values = valid_values_of(handle, args.display_mask, attr)?;

    Ok(ValidReport {
        target: handle.target().to_string(),
        attribute: attr.name.to_string(),
        values,
    })
}

/// Execute the valid command
pub fn run_valid(system: &CtrlSystem, args: &ValidArgs, format: OutputFormat) -> Result<()> {
    let report = valid(system, args)?;
    print_output(&report, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ids;
    use crate::commands::testing;
    use crate::domain::{Permissions, Target, ValidValues, ValueType};
    use crate::error::{AppError, CtrlError};

    fn args(attribute: &str, target: Option<Target>) -> ValidArgs {
        ValidArgs {
            attribute: attribute.to_string(),
            target,
            display_mask: 0,
        }
    }

    #[test]
    fn test_valid_from_server() {
        let (nv, system) = testing::session();
        let range = ValidValues::new(
            ValueType::Range { min: 0, max: 1 },
            Permissions::READ_WRITE | Permissions::GPU,
        );
        nv.set_valid_values(Target::gpu(0), ids::GPU_COOLER_MANUAL_CONTROL, range);

        let report = valid(&system, &args("GPUFanControlState", Some(Target::gpu(0)))).unwrap();
        assert_eq!(report.values, range);
        assert_eq!(report.target, "[gpu:0]");
    }

    #[test]
    fn test_valid_local_attributes() {
        let (_, system) = testing::session();

        let report = valid(&system, &args("XRandRPresent", Some(Target::x_screen(0)))).unwrap();
        assert_eq!(report.values.value_type, ValueType::Bool);
        assert!(!report.values.permissions.writable());

        let report = valid(&system, &args("EDID", Some(Target::gpu(0)))).unwrap();
        assert_eq!(report.values.value_type, ValueType::Binary);
    }

    #[test]
    fn test_valid_missing_backend() {
        let (_, system) = testing::session();
        let result = valid(&system, &args("XVideoOverlayHue", Some(Target::x_screen(0))));
        assert!(matches!(
            result,
            Err(AppError::Ctrl(CtrlError::MissingExtension))
        ));
    }
}
