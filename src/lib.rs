//! nvsettings - NVIDIA attribute control library
//!
//! One per-target attribute handle fronts NV-CONTROL, the XF86VidMode, Xv,
//! GLX and XRandR extensions, NVML and Vulkan. Every attribute ID belongs
//! to exactly one backend, and the handle routes each request to it.
//!
//! # Modules
//!
//! - [`attributes`]: Attribute IDs, names and the ownership registry
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`handle`]: The per-target attribute dispatcher
//! - [`nvcontrol`]: NV-CONTROL protocol client
//! - [`nvml`]: NVML abstraction layer
//! - [`services`]: Event callbacks and the event loop
//! - [`system`]: Session setup and target enumeration
//! - [`vulkan`]: Vulkan instance probe
//! - [`xext`]: X extension backends and the gamma engine

pub mod attributes;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod handle;
pub mod nvcontrol;
pub mod nvml;
pub mod services;
pub mod system;
pub mod vulkan;
pub mod xext;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use attributes::{AttributeKind, AttributeRegistry, Backend};
pub use error::{AppError, CtrlError, CtrlResult, Result};
pub use handle::{AttributeHandle, HandleBuilder, Subsystems};
pub use system::CtrlSystem;
