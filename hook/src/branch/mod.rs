//! Branch controller: active branch lookup, checkout, listing.

pub mod controller;

pub use controller::{BranchController, CheckoutOutcome};
