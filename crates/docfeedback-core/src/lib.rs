//! docfeedback core: error type, configuration, service capabilities.

pub mod capabilities;
pub mod config;
pub mod error;

pub use capabilities::{ServiceCapabilities, ServiceMode};
pub use config::{DataPaths, FeedbackConfig};
pub use error::{Error, ReadFailure, Result, WriteFailure};
