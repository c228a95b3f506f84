//! Download task execution -- core download lifecycle and part fetching.
//!
//! Split into focused submodules:
//! - [`context`] - Registration, shared state and terminal events
//! - [`orchestration`] - Top-level download task lifecycle
//! - [`parts`] - Parallel part fetching with the first-error policy
//! - [`finalization`] - Result reporting and unregistration

mod context;
mod finalization;
mod orchestration;
mod parts;
