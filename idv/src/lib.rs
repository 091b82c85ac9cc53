//! Identity verification (IDV) oracle.
//!
//! The engine only asks one question: is this member verified? The
//! [`IdvOracle`] trait is that question; [`HttpIdvOracle`] answers it from the
//! identity service's external check endpoint.

pub mod client;
pub mod error;
pub mod oracle;
pub mod status;

pub use client::HttpIdvOracle;
pub use error::OracleError;
pub use oracle::IdvOracle;
pub use status::IdvStatus;
