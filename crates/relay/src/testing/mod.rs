//! Test doubles for the relay's collaborator boundaries.
//!
//! Used by this crate's own tests and available to embedding applications
//! that want to exercise offline flows without a network.

mod mocks;

pub use self::mocks::{ManualProbe, MemoryQueueStorage, MemorySink, MockTransport};
