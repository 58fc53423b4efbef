//! Internal implementation details not exposed in the public API.

mod prototype;

pub(crate) use prototype::PrototypeGuard;
