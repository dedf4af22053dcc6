//! Session-stored types for the admin panel.

pub mod session;

pub use session::{CurrentAdmin, Flash, keys as session_keys, set_flash, take_flash};
