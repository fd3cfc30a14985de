//! barraca-backend: checkout payments for a construction-materials
//! storefront
//!
//! Integrates the PlaceToPay web-checkout gateway: per-call digest
//! authentication, session creation and status polling, approval
//! evaluation and the post-payment return flow, plus the USD/UYU rate
//! lookup the storefront prices with.

pub mod api;
pub mod config;
pub mod error;
pub mod payments;
pub mod rates;
pub mod return_flow;
