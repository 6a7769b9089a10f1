//! UI-facing operation surface: one thin wrapper per operation the renderer
//! invokes across the privilege boundary. Progress for the long-running
//! operations is delivered out-of-band through [`crate::progress::ProgressBus`]
//! subscriptions.

pub mod install;
pub mod records;
pub mod system;
