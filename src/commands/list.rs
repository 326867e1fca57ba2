//! List command implementation
//!
//! Lists every target and the backends answering on it.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, TargetEntry, TargetList};
use crate::error::Result;
use crate::system::CtrlSystem;

/// Collect one entry per target handle
pub fn list_targets(system: &CtrlSystem) -> TargetList {
    let targets = system
        .handles()
        .map(|handle| {
            let target = handle.target();
            TargetEntry {
                target: target.to_string(),
                kind: target.kind.to_string(),
                id: target.id,
                backends: handle.subsystems().names(),
            }
        })
        .collect();

    TargetList { targets }
}

/// Execute the list command
pub fn run_list(system: &CtrlSystem, format: OutputFormat) -> Result<()> {
    let list = list_targets(system);
    print_output(&list, format)?;
    Ok(())
}
