//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::domain::{Channel, Target};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// NVIDIA attribute control
///
/// Query and assign NV-CONTROL, X extension, NVML and Vulkan attributes
/// through one name space.
#[derive(Parser, Debug)]
#[command(name = "nvsettings")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "NVSETTINGS_CONFIG")]
    pub config: Option<String>,

    /// X display to connect to
    #[arg(short, long, global = true, env = "DISPLAY")]
    pub display: Option<String>,

    /// Dry run mode - don't actually apply changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List targets and the backends available on each
    List,

    /// Read an attribute
    Query(QueryArgs),

    /// Write an attribute
    Assign(AssignArgs),

    /// Show the valid values of an attribute
    Valid(ValidArgs),

    /// Show or change color correction
    Color(ColorArgs),

    /// Print attribute change events
    Watch(WatchArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the query command
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Attribute name, e.g. GPUCoreTemp
    pub attribute: String,

    /// Target as TYPE:ID (default: the first target that answers)
    #[arg(short, long)]
    pub target: Option<Target>,

    /// Display device mask, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0", value_parser = parse_mask)]
    pub display_mask: u32,
}

/// Arguments for the assign command
#[derive(Parser, Debug)]
pub struct AssignArgs {
    /// Assignment as ATTRIBUTE=VALUE
    #[arg(value_parser = parse_assignment)]
    pub assignment: (String, String),

    /// Target as TYPE:ID (default: the first target that answers)
    #[arg(short, long)]
    pub target: Option<Target>,

    /// Display device mask, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0", value_parser = parse_mask)]
    pub display_mask: u32,
}

/// Arguments for the valid command
#[derive(Parser, Debug)]
pub struct ValidArgs {
    /// Attribute name
    pub attribute: String,

    /// Target as TYPE:ID (default: the first target that answers)
    #[arg(short, long)]
    pub target: Option<Target>,

    /// Display device mask, decimal or 0x-prefixed hex
    #[arg(long, default_value = "0", value_parser = parse_mask)]
    pub display_mask: u32,
}

/// Arguments for the color command
#[derive(Parser, Debug)]
pub struct ColorArgs {
    /// X screen or display device (default: screen:0)
    #[arg(short, long, default_value = "screen:0")]
    pub target: Target,

    /// Channels to change (default: all)
    #[arg(long = "channel", value_delimiter = ',')]
    pub channels: Vec<Channel>,

    /// Contrast, -1.0 to 1.0
    #[arg(long, allow_hyphen_values = true)]
    pub contrast: Option<f32>,

    /// Brightness, -1.0 to 1.0
    #[arg(long, allow_hyphen_values = true)]
    pub brightness: Option<f32>,

    /// Gamma, 0.1 to 10.0
    #[arg(long)]
    pub gamma: Option<f32>,

    /// Include the gamma ramp in the output
    #[arg(long)]
    pub ramp: bool,
}

impl ColorArgs {
    /// Whether any value is being assigned
    pub fn is_assignment(&self) -> bool {
        self.contrast.is_some() || self.brightness.is_some() || self.gamma.is_some()
    }
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Only print changes of these attributes (default: all)
    #[arg(short, long = "attribute")]
    pub attributes: Vec<String>,

    /// Stop after this many events
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Compact single-line format
    Compact,
}

fn parse_mask(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| format!("invalid display mask: {}", s))
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ATTRIBUTE=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing attribute name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetType;

    #[test]
    fn test_cli_parse_list() {
        let args = Cli::try_parse_from(["nvsettings", "list"]).unwrap();
        assert!(matches!(args.command, Commands::List));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let args = Cli::try_parse_from(["nvsettings", "-v", "list"]).unwrap();
        assert!(args.verbose);
    }

    #[test]
    fn test_cli_parse_display() {
        let args = Cli::try_parse_from(["nvsettings", "-d", ":1", "list"]).unwrap();
        assert_eq!(args.display.as_deref(), Some(":1"));
    }

    #[test]
    fn test_cli_parse_query() {
        let args = Cli::try_parse_from([
            "nvsettings",
            "query",
            "GPUCoreTemp",
            "--target",
            "gpu:1",
            "--display-mask",
            "0x10",
        ])
        .unwrap();
        if let Commands::Query(query) = args.command {
            assert_eq!(query.attribute, "GPUCoreTemp");
            assert_eq!(query.target, Some(Target::gpu(1)));
            assert_eq!(query.display_mask, 0x10);
        } else {
            panic!("Expected Query command");
        }
    }

    #[test]
    fn test_cli_parse_assign() {
        let args =
            Cli::try_parse_from(["nvsettings", "assign", "GPUFanControlState = 1", "-t", "gpu:0"])
                .unwrap();
        if let Commands::Assign(assign) = args.command {
            assert_eq!(
                assign.assignment,
                ("GPUFanControlState".to_string(), "1".to_string())
            );
            assert_eq!(assign.target, Some(Target::gpu(0)));
        } else {
            panic!("Expected Assign command");
        }
    }

    #[test]
    fn test_cli_assign_requires_equals() {
        assert!(Cli::try_parse_from(["nvsettings", "assign", "GPUFanControlState"]).is_err());
        assert!(Cli::try_parse_from(["nvsettings", "assign", "=1"]).is_err());
    }

    #[test]
    fn test_cli_rejects_bad_target() {
        let result = Cli::try_parse_from(["nvsettings", "query", "NvPresent", "-t", "monitor:0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_color() {
        let args = Cli::try_parse_from([
            "nvsettings",
            "color",
            "--target",
            "dpy:2",
            "--channel",
            "red,blue",
            "--brightness",
            "-0.25",
            "--ramp",
        ])
        .unwrap();
        if let Commands::Color(color) = args.command {
            assert_eq!(color.target, Target::new(TargetType::Display, 2));
            assert_eq!(color.channels, vec![Channel::Red, Channel::Blue]);
            assert_eq!(color.brightness, Some(-0.25));
            assert!(color.ramp);
            assert!(color.is_assignment());
        } else {
            panic!("Expected Color command");
        }
    }

    #[test]
    fn test_cli_color_defaults() {
        let args = Cli::try_parse_from(["nvsettings", "color"]).unwrap();
        if let Commands::Color(color) = args.command {
            assert_eq!(color.target, Target::x_screen(0));
            assert!(color.channels.is_empty());
            assert!(!color.is_assignment());
        } else {
            panic!("Expected Color command");
        }
    }

    #[test]
    fn test_cli_parse_watch() {
        let args = Cli::try_parse_from([
            "nvsettings",
            "watch",
            "-a",
            "GPUCoreTemp",
            "-a",
            "GPUCurrentFanSpeed",
            "-n",
            "5",
        ])
        .unwrap();
        if let Commands::Watch(watch) = args.command {
            assert_eq!(watch.attributes, vec!["GPUCoreTemp", "GPUCurrentFanSpeed"]);
            assert_eq!(watch.count, Some(5));
        } else {
            panic!("Expected Watch command");
        }
    }

    #[test]
    fn test_parse_mask() {
        assert_eq!(parse_mask("0"), Ok(0));
        assert_eq!(parse_mask("0x8"), Ok(8));
        assert_eq!(parse_mask("256"), Ok(256));
        assert!(parse_mask("0xZZ").is_err());
    }

    #[test]
    fn test_cli_format_json() {
        let args = Cli::try_parse_from(["nvsettings", "--format", "json", "list"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
    }
}
