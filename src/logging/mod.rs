//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - Configurable log levels, overridable with `RUST_LOG`
//! - JSON log files with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use phdc::logging::init_logging;
//! use phdc::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export operation
///
/// # Example
///
/// ```no_run
/// use phdc::log_export_start;
///
/// log_export_start!("USA, State 1", 120, false);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($jurisdiction:expr, $patients:expr, $dry_run:expr) => {
        tracing::info!(
            jurisdiction = %$jurisdiction,
            patients = $patients,
            dry_run = $dry_run,
            "Starting export"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use phdc::log_error_with_context;
/// use phdc::domain::PhdcError;
///
/// let error = PhdcError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
