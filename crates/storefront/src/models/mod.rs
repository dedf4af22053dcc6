//! Session-held state for the storefront.
//!
//! The storefront has no database: the cart and the last placed order live in
//! the visitor's session, everything else comes from the Roomily backend.

pub mod cart;
pub mod session;

pub use cart::{AppliedCoupon, CartError, CartLine, SessionCart};
pub use session::{PlacedOrder, keys as session_keys, placed_order, remember_order};
