//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::attributes::AttributeKind;
use crate::cli::args::OutputFormat;
use crate::domain::{ColorValue, GammaInput, ValidValues};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// One row of `list`
#[derive(Debug, Clone, Serialize)]
pub struct TargetEntry {
    pub target: String,
    pub kind: String,
    pub id: u32,
    pub backends: Vec<&'static str>,
}

/// Output of `list`
#[derive(Debug, Clone, Serialize)]
pub struct TargetList {
    pub targets: Vec<TargetEntry>,
}

impl TableDisplay for TargetList {
    fn to_table(&self) -> String {
        if self.targets.is_empty() {
            return "No targets found".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!("{:<18} {:<26} {}\n", "TARGET", "TYPE", "BACKENDS"));
        output.push_str(&format!("{}\n", "-".repeat(72)));
        for entry in &self.targets {
            output.push_str(&format!(
                "{:<18} {:<26} {}\n",
                entry.target,
                entry.kind,
                entry.backends.join(", ")
            ));
        }
        output.trim_end().to_string()
    }

    fn to_compact(&self) -> String {
        self.targets
            .iter()
            .map(|t| format!("{}:{}", t.target, t.backends.join("+")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A queried attribute value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    String(String),
    Binary(Vec<u8>),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Integer(v) => write!(f, "{}", v),
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Binary(bytes) => {
                let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                write!(f, "{} bytes: {}", bytes.len(), hex.join(" "))
            }
        }
    }
}

/// Output of `query` and `assign`
#[derive(Debug, Clone, Serialize)]
pub struct AttributeReport {
    pub target: String,
    pub attribute: String,
    pub kind: AttributeKind,
    pub value: AttributeValue,
}

impl TableDisplay for AttributeReport {
    fn to_table(&self) -> String {
        format!(
            "Attribute '{}' ({}): {}",
            self.attribute, self.target, self.value
        )
    }

    fn to_compact(&self) -> String {
        format!("{}={}", self.attribute, self.value)
    }
}

/// Output of `valid`
#[derive(Debug, Clone, Serialize)]
pub struct ValidReport {
    pub target: String,
    pub attribute: String,
    #[serde(flatten)]
    pub values: ValidValues,
}

impl TableDisplay for ValidReport {
    fn to_table(&self) -> String {
        let access = match (
            self.values.permissions.readable(),
            self.values.permissions.writable(),
        ) {
            (true, true) => "read-write",
            (true, false) => "read-only",
            (false, true) => "write-only",
            (false, false) => "no access",
        };
        format!(
            "Attribute '{}' ({})\n  Type:   {}\n  Access: {}",
            self.attribute, self.target, self.values.value_type, access
        )
    }
}

/// Ramp contents for one color state
#[derive(Debug, Clone, Serialize)]
pub struct RampDump {
    pub red: Vec<u16>,
    pub green: Vec<u16>,
    pub blue: Vec<u16>,
}

/// Output of `color`
#[derive(Debug, Clone, Serialize)]
pub struct ColorReport {
    pub target: String,
    pub contrast: [f32; 3],
    pub brightness: [f32; 3],
    pub gamma: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp: Option<RampDump>,
}

impl ColorReport {
    pub fn new(target: String, input: &GammaInput) -> Self {
        Self {
            target,
            contrast: input.values(ColorValue::Contrast),
            brightness: input.values(ColorValue::Brightness),
            gamma: input.values(ColorValue::Gamma),
            ramp: None,
        }
    }
}

impl TableDisplay for ColorReport {
    fn to_table(&self) -> String {
        let mut output = format!("Color correction on {}\n", self.target);
        output.push_str(&format!(
            "{:<10} {:>8} {:>8} {:>8}\n",
            "", "RED", "GREEN", "BLUE"
        ));
        for (label, values) in [
            ("Contrast", self.contrast),
            ("Brightness", self.brightness),
            ("Gamma", self.gamma),
        ] {
            output.push_str(&format!(
                "{:<10} {:>8.3} {:>8.3} {:>8.3}\n",
                label, values[0], values[1], values[2]
            ));
        }

        if let Some(ramp) = &self.ramp {
            output.push_str(&format!("\nRamp ({} entries)\n", ramp.red.len()));
            for (i, ((r, g), b)) in ramp
                .red
                .iter()
                .zip(&ramp.green)
                .zip(&ramp.blue)
                .enumerate()
            {
                output.push_str(&format!("{:>5}: {:>5} {:>5} {:>5}\n", i, r, g, b));
            }
        }

        output.trim_end().to_string()
    }

    fn to_compact(&self) -> String {
        let fmt3 = |v: [f32; 3]| format!("{:.2}/{:.2}/{:.2}", v[0], v[1], v[2]);
        format!(
            "{} contrast={} brightness={} gamma={}",
            self.target,
            fmt3(self.contrast),
            fmt3(self.brightness),
            fmt3(self.gamma)
        )
    }
}

/// One change event printed by `watch`
#[derive(Debug, Clone, Serialize)]
pub struct EventLine {
    pub time: u32,
    pub target: String,
    pub attribute: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl TableDisplay for EventLine {
    fn to_table(&self) -> String {
        match self.available {
            Some(available) => format!(
                "{} {} {} {}",
                self.target,
                self.attribute,
                if available { "available" } else { "unavailable" },
                self.value
            ),
            None => format!(
                "{} {} changed to {}",
                self.target, self.attribute, self.value
            ),
        }
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColorMask, Permissions, ValueType};

    #[test]
    fn test_target_list_table() {
        let list = TargetList {
            targets: vec![TargetEntry {
                target: "[gpu:0]".to_string(),
                kind: "GPU".to_string(),
                id: 0,
                backends: vec!["nv-control", "nvml"],
            }],
        };

        let output = list.to_table();
        assert!(output.contains("[gpu:0]"));
        assert!(output.contains("nv-control, nvml"));
        assert_eq!(list.to_compact(), "[gpu:0]:nv-control+nvml");
    }

    #[test]
    fn test_empty_target_list() {
        let list = TargetList { targets: vec![] };
        assert_eq!(list.to_table(), "No targets found");
    }

    #[test]
    fn test_attribute_report_formats() {
        let report = AttributeReport {
            target: "[gpu:0]".to_string(),
            attribute: "GPUCoreTemp".to_string(),
            kind: AttributeKind::Integer,
            value: AttributeValue::Integer(45),
        };
        assert_eq!(report.to_table(), "Attribute 'GPUCoreTemp' ([gpu:0]): 45");
        assert_eq!(report.to_compact(), "GPUCoreTemp=45");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["value"], 45);
        assert_eq!(json["kind"], "integer");
    }

    #[test]
    fn test_binary_value_hex() {
        let value = AttributeValue::Binary(vec![0x00, 0xff, 0x10]);
        assert_eq!(value.to_string(), "3 bytes: 00 ff 10");
    }

    #[test]
    fn test_valid_report_access() {
        let report = ValidReport {
            target: "[fan:0]".to_string(),
            attribute: "GPUTargetFanSpeed".to_string(),
            values: ValidValues::new(
                ValueType::Range { min: 0, max: 100 },
                Permissions::READ_WRITE | Permissions::COOLER,
            ),
        };
        let output = report.to_table();
        assert!(output.contains("range 0 - 100"));
        assert!(output.contains("read-write"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["value_type"]["type"], "range");
        assert_eq!(json["value_type"]["max"], 100);
    }

    #[test]
    fn test_color_report() {
        let mut input = GammaInput::default();
        input.assign(ColorValue::Gamma, [2.0; 3], ColorMask::RED);
        let mut report = ColorReport::new("[screen:0]".to_string(), &input);
        assert_eq!(report.gamma, [2.0, 1.0, 1.0]);
        assert!(report.to_table().contains("Gamma"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("ramp").is_none());

        report.ramp = Some(RampDump {
            red: vec![0, 65535],
            green: vec![0, 65535],
            blue: vec![0, 65535],
        });
        assert!(report.to_table().contains("Ramp (2 entries)"));
    }

    #[test]
    fn test_event_line() {
        let line = EventLine {
            time: 0,
            target: "[gpu:0]".to_string(),
            attribute: "GPUCoreTemp".to_string(),
            value: 61,
            available: None,
        };
        assert_eq!(line.to_table(), "[gpu:0] GPUCoreTemp changed to 61");
    }

    #[test]
    fn test_message_display() {
        let msg = Message {
            message: "Operation completed".to_string(),
            success: true,
        };

        assert!(msg.to_table().starts_with('✓'));
    }
}
