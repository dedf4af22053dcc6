//! Roomily Core - Shared types library.
//!
//! This crate provides common types used across all Roomily components:
//! - `storefront` - Public-facing fashion store
//! - `admin` - Internal dashboard for catalog, coupon, banner and order management
//!
//! # Architecture
//!
//! The core crate contains only types and pure calculations - no I/O, no HTTP
//! clients. The Roomily REST backend owns every business rule; the types here
//! mirror its payloads and the arithmetic the front ends show to shoppers.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, phone numbers and statuses
//! - [`pricing`] - Cart totals, shipping threshold and coupon discount math
//! - [`model`] - Payloads exchanged with the REST backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod model;
pub mod pricing;
pub mod types;

pub use pricing::{CartTotals, DiscountPercent, PricedLine, PricingError, ShippingPolicy};
pub use types::*;
