//! # bootmount-common
//!
//! Shared types for the bootmount guest mount orchestrator:
//! - Structured error type with diagnostic codes
//! - Standard kernel and guest paths

#![warn(missing_docs)]

pub mod error;
pub mod paths;

pub use error::{BootError, BootResult};
pub use paths::BootPaths;
