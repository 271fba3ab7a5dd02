//! LMSR Engine - Library Root
//!
//! Binary-market pricing with the logarithmic market scoring rule, plus
//! the quote/commit layer that serializes trades per market.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
pub mod usecases;
