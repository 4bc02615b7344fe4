//! Failure-counter store.
//!
//! One artifact per supervisor session, named `<prefix><ordinal>`, holding the
//! decimal failure count. External monitors read these files directly.

mod store;

pub use store::{CounterStore, SessionId};
