//! PlotPay - payment reconciliation service for a network of land listing sites
//!
//! This library provides the core functionality for the PlotPay service,
//! including the per-site ledger, Paystack integration, webhook reconciliation,
//! and API handlers.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod tenancy;
pub mod util;
