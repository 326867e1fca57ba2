//! Unified error types for nvsettings
//!
//! The attribute layer reports a closed set of statuses ([`CtrlError`]);
//! everything around it (library loading, configuration, the CLI shell)
//! uses richer thiserror enums that are folded into [`AppError`].

use crate::attributes::AttributeKind;
use serde::Serialize;
use thiserror::Error;

/// Status of a failed attribute operation
///
/// Every dispatch call returns one of these on failure. Backend errors are
/// converted into this set before they reach a caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtrlError {
    /// Malformed input (bad value, bad display mask)
    #[error("Bad Argument")]
    BadArgument,

    /// Handle and target type do not fit this call
    #[error("Bad Handle")]
    BadHandle,

    /// Attribute ID not recognized by any backend
    #[error("No Attribute")]
    NoAttribute,

    /// Attribute recognized but its backend is not initialized
    #[error("Missing Extension")]
    MissingExtension,

    /// Attribute cannot be written
    #[error("Read Only Attribute")]
    ReadOnlyAttribute,

    /// Attribute cannot be read
    #[error("Write Only Attribute")]
    WriteOnlyAttribute,

    /// Backend reachable but this instance does not support the attribute
    #[error("Attribute Not Available")]
    AttributeNotAvailable,

    /// Feature absent on this NVML/driver version
    #[error("Not Supported")]
    NotSupported,

    /// Generic backend failure
    #[error("Unknown Error")]
    Error,
}

/// Result of an attribute operation
pub type CtrlResult<T> = std::result::Result<T, CtrlError>;

/// Return status of an attribute call, including success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReturnStatus {
    Success,
    BadArgument,
    BadHandle,
    NoAttribute,
    MissingExtension,
    ReadOnlyAttribute,
    WriteOnlyAttribute,
    AttributeNotAvailable,
    NotSupported,
    Error,
}

impl From<CtrlError> for ReturnStatus {
    fn from(err: CtrlError) -> Self {
        match err {
            CtrlError::BadArgument => ReturnStatus::BadArgument,
            CtrlError::BadHandle => ReturnStatus::BadHandle,
            CtrlError::NoAttribute => ReturnStatus::NoAttribute,
            CtrlError::MissingExtension => ReturnStatus::MissingExtension,
            CtrlError::ReadOnlyAttribute => ReturnStatus::ReadOnlyAttribute,
            CtrlError::WriteOnlyAttribute => ReturnStatus::WriteOnlyAttribute,
            CtrlError::AttributeNotAvailable => ReturnStatus::AttributeNotAvailable,
            CtrlError::NotSupported => ReturnStatus::NotSupported,
            CtrlError::Error => ReturnStatus::Error,
        }
    }
}

impl<T> From<&CtrlResult<T>> for ReturnStatus {
    fn from(result: &CtrlResult<T>) -> Self {
        match result {
            Ok(_) => ReturnStatus::Success,
            Err(e) => (*e).into(),
        }
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnStatus::Success => write!(f, "Success"),
            ReturnStatus::BadArgument => CtrlError::BadArgument.fmt(f),
            ReturnStatus::BadHandle => CtrlError::BadHandle.fmt(f),
            ReturnStatus::NoAttribute => CtrlError::NoAttribute.fmt(f),
            ReturnStatus::MissingExtension => CtrlError::MissingExtension.fmt(f),
            ReturnStatus::ReadOnlyAttribute => CtrlError::ReadOnlyAttribute.fmt(f),
            ReturnStatus::WriteOnlyAttribute => CtrlError::WriteOnlyAttribute.fmt(f),
            ReturnStatus::AttributeNotAvailable => CtrlError::AttributeNotAvailable.fmt(f),
            ReturnStatus::NotSupported => CtrlError::NotSupported.fmt(f),
            ReturnStatus::Error => CtrlError::Error.fmt(f),
        }
    }
}

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Attribute operation failed
    #[error("{0}")]
    Ctrl(#[from] CtrlError),

    /// Error from NVML operations
    #[error("NVML error: {0}")]
    Nvml(#[from] NvmlError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Attribute table is inconsistent
    #[error("Attribute registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Could not open the X display
    #[error("Unable to open display: {0}")]
    Display(String),

    /// No handle exists for the requested target
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// Attribute name not known
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Value could not be parsed for the attribute
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from NVML wrapper operations
#[derive(Error, Debug)]
pub enum NvmlError {
    /// Failed to initialize NVML library
    #[error("Failed to initialize NVML: {0}")]
    InitializationFailed(String),

    /// NVML library not found
    #[error("NVML library not found. Is the NVIDIA driver installed?")]
    LibraryNotFound,

    /// Device not found at index
    #[error("GPU device not found at index {0}")]
    DeviceNotFound(u32),

    /// Operation not supported by this GPU
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Insufficient permissions
    #[error("Insufficient permissions: {0}. Try running with sudo.")]
    InsufficientPermissions(String),

    /// Unknown NVML error
    #[error("NVML error: {0}")]
    Unknown(String),

    /// GPU is lost (fallen off bus, etc.)
    #[error("GPU is lost or has become inaccessible")]
    GpuLost,

    /// Invalid argument passed to NVML
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<&NvmlError> for CtrlError {
    fn from(err: &NvmlError) -> Self {
        match err {
            NvmlError::NotSupported(_) => CtrlError::NotSupported,
            NvmlError::InvalidArgument(_) => CtrlError::BadArgument,
            _ => CtrlError::Error,
        }
    }
}

/// Errors from loading the Vulkan loader library
#[derive(Error, Debug)]
pub enum VulkanError {
    /// The loader could not be opened
    #[error("Vulkan loader not found: {0}")]
    LibraryNotFound(String),

    /// A required entry point is missing
    #[error("Required Vulkan symbol missing: {0}")]
    MissingSymbol(&'static str),

    /// A Vulkan call returned a failure code
    #[error("{call} failed with {code}")]
    Call { call: &'static str, code: i32 },
}

/// Errors from building the attribute registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two ranges of the same kind share IDs
    #[error("{kind:?} range {first:?} overlaps {second:?}")]
    Overlap {
        kind: AttributeKind,
        first: (u32, u32),
        second: (u32, u32),
    },

    /// A range with last < first
    #[error("{kind:?} range {first}..={last} is empty")]
    EmptyRange {
        kind: AttributeKind,
        first: u32,
        last: u32,
    },

    /// Attribute name registered twice
    #[error("attribute name '{0}' registered twice")]
    DuplicateName(String),

    /// Attribute ID registered twice under different names
    #[error("{kind:?} attribute {id} registered twice")]
    DuplicateId { kind: AttributeKind, id: u32 },

    /// Named attribute falls outside every range
    #[error("attribute '{0}' has no owning backend")]
    Unowned(String),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Cooler level outside 0-100
    #[error("Invalid cooler level: {0} (must be 0-100)")]
    InvalidCoolerLevel(i64),

    /// Target specification could not be parsed
    #[error("Invalid target: {0} (expected TYPE:ID, e.g. gpu:0)")]
    InvalidTarget(String),

    /// Color channel name not known
    #[error("Invalid color channel: {0}")]
    InvalidChannel(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
