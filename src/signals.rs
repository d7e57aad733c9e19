//! Synchronous multicast subjects the store publishes on
//!
//! Binding layers rarely need this module directly; it is exposed for
//! custom channels built on the same [`Subject`] type.

pub use reinhardt_form_signals::*;
