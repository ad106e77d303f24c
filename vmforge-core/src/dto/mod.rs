//! Data transfer objects
//!
//! Request shapes sent to the control plane. Kept apart from the domain
//! types so the wire surface can evolve without touching run state.

pub mod vm;
