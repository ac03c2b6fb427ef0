//! Run lifecycle coordination.

pub mod hook;
pub mod params;
pub mod state;

pub use hook::DoltHook;
pub use params::{BRANCH_PARAM, RunParams};
pub use state::HookState;
