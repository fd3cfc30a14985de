//! PlaceToPay web-checkout integration
//!
//! Session creation, status polling, per-call authentication and approval
//! evaluation for the storefront's redirect-based checkout.

pub mod approval;
pub mod auth;
pub mod client;
pub mod types;

pub use approval::{is_approved, payment_reference, ApprovalPolicy};
pub use client::{NewSession, RetryPolicy, WebCheckoutClient};
