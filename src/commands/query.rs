//! Query command implementation
//!
//! Reads an attribute by name from one target, or from every target that
//! answers it.

use crate::attributes::{AttributeKind, NamedAttribute};
use crate::cli::args::{OutputFormat, QueryArgs};
use crate::cli::output::{print_output, AttributeReport, AttributeValue, TableDisplay};
use crate::commands::lookup_attribute;
use crate::error::{AppError, CtrlError, CtrlResult, Result};
use crate::handle::AttributeHandle;
use crate::system::CtrlSystem;
use serde::Serialize;

/// Every answer to one query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResults {
    pub results: Vec<AttributeReport>,
}

impl TableDisplay for QueryResults {
    fn to_table(&self) -> String {
        self.results
            .iter()
            .map(TableDisplay::to_table)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_compact(&self) -> String {
        self.results
            .iter()
            .map(TableDisplay::to_compact)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read `attr` from one handle
pub fn read_attribute(
    handle: &AttributeHandle,
    display_mask: u32,
    attr: NamedAttribute,
) -> CtrlResult<AttributeReport> {
    let value = match attr.kind {
        AttributeKind::Integer => {
            AttributeValue::Integer(handle.get_display_attribute64(display_mask, attr.id)?)
        }
        AttributeKind::String => AttributeValue::String(
            handle.get_string_display_attribute(display_mask, attr.id)?,
        ),
        AttributeKind::Binary => {
            AttributeValue::Binary(handle.get_binary_attribute(display_mask, attr.id)?)
        }
        AttributeKind::StringOperation => return Err(CtrlError::WriteOnlyAttribute),
    };

    Ok(AttributeReport {
        target: handle.target().to_string(),
        attribute: attr.name.to_string(),
        kind: attr.kind,
        value,
    })
}

/// Query `args.attribute` on the selected target, or on all targets
///
/// Without a target, targets that do not answer are skipped; the query
/// fails only when none answers.
pub fn query(system: &CtrlSystem, args: &QueryArgs) -> Result<QueryResults> {
    let attr = lookup_attribute(system, &args.attribute)?;

    if let Some(target) = args.target {
        let handle = system.target(target)?;
        let report = read_attribute(handle, args.display_mask, attr)?;
        return Ok(QueryResults {
            results: vec![report],
        });
    }

    let mut first_error = None;
    let mut results = Vec::new();
    for handle in system.handles() {
        match read_attribute(handle, args.display_mask, attr) {
            Ok(report) => results.push(report),
            Err(e) => {
                log::debug!("{} on {}: {}", attr.name, handle.target(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if results.is_empty() {
        return Err(match first_error {
            Some(e) => AppError::Ctrl(e),
            None => AppError::TargetNotFound("no targets available".to_string()),
        });
    }
    Ok(QueryResults { results })
}

/// Execute the query command
pub fn run_query(system: &CtrlSystem, args: &QueryArgs, format: OutputFormat) -> Result<()> {
    let results = query(system, args)?;
    print_output(&results, format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::ids;
    use crate::commands::testing;
    use crate::domain::Target;

    fn args(attribute: &str, target: Option<Target>) -> QueryArgs {
        QueryArgs {
            attribute: attribute.to_string(),
            target,
            display_mask: 0,
        }
    }

    #[test]
    fn test_query_integer_on_target() {
        let (nv, system) = testing::session();
        nv.set_attribute_value(Target::gpu(0), ids::GPU_CORE_TEMPERATURE, 52);

        let results = query(&system, &args("GPUCoreTemp", Some(Target::gpu(0)))).unwrap();
        assert_eq!(results.results.len(), 1);
        assert_eq!(results.results[0].value, AttributeValue::Integer(52));
        assert_eq!(results.results[0].attribute, "GPUCoreTemp");
    }

    #[test]
    fn test_query_all_skips_silent_targets() {
        let (nv, system) = testing::session();
        nv.set_string_value(Target::gpu(0), ids::STRING_PRODUCT_NAME, "Mock GPU");

        let results = query(&system, &args("productname", None)).unwrap();
        assert_eq!(results.results.len(), 1);
        assert_eq!(results.results[0].target, "[gpu:0]");
        assert_eq!(
            results.results[0].value,
            AttributeValue::String("Mock GPU".to_string())
        );
    }

    #[test]
    fn test_query_binary() {
        let (nv, system) = testing::session();
        nv.set_binary_value(Target::gpu(0), ids::BINARY_DATA_COOLERS_USED_BY_GPU, vec![1, 0, 0, 0]);

        let results = query(&system, &args("CoolersUsedByGPU", Some(Target::gpu(0)))).unwrap();
        assert_eq!(
            results.results[0].value,
            AttributeValue::Binary(vec![1, 0, 0, 0])
        );
    }

    #[test]
    fn test_query_presence_flag() {
        let (_, system) = testing::session();
        let results = query(&system, &args("NvmlPresent", Some(Target::gpu(0)))).unwrap();
        assert_eq!(results.results[0].value, AttributeValue::Integer(0));
    }

    #[test]
    fn test_query_errors() {
        let (_, system) = testing::session();
        assert!(matches!(
            query(&system, &args("Bogus", None)),
            Err(AppError::UnknownAttribute(_))
        ));
        assert!(matches!(
            query(&system, &args("GPUCoreTemp", None)),
            Err(AppError::Ctrl(CtrlError::AttributeNotAvailable))
        ));
        assert!(matches!(
            query(&system, &args("GTFModeline", Some(Target::x_screen(0)))),
            Err(AppError::Ctrl(CtrlError::WriteOnlyAttribute))
        ));
    }
}
