//! Playcheck - automated playability check for the chat frontend and BFF.
//!
//! This crate provides:
//! - Configuration resolution with fail-fast validation of required inputs
//! - Authenticated wallet balance reads against the BFF ledger
//! - A headless-browser chat scenario with correlated response matching
//! - Best-effort failure screenshots attached to propagated errors
//! - Delta reconciliation and a single structured JSON report per run
//!
//! # Example
//!
//! ```rust,no_run
//! use playcheck::{ConfigSource, RunConfig, run_check};
//!
//! # async fn demo() {
//! let config = RunConfig::resolve(&ConfigSource::from_env()).unwrap();
//! let outcome = run_check(&config).await;
//! std::process::exit(outcome.emit());
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod outcome;
pub mod runner;
pub mod scenario;
pub mod wallet;

// Re-export configuration types
pub use config::{ConfigSource, RunConfig};

// Re-export the error taxonomy
pub use error::{CheckError, CheckResult};

// Re-export outcome and reporting types
pub use outcome::{CheckOutcome, DELTA_TOLERANCE};

// Re-export the orchestrator
pub use runner::run_check;

// Re-export scenario and probe types
pub use health::HealthUrlCache;
pub use scenario::ChatExchange;
pub use wallet::WalletProbe;
