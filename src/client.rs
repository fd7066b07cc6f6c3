//! The caller-side façade: a per-call response correlator wrapping an
//! [`Endpoint`](crate::endpoint) pair, plus the untyped/typed stubs built on
//! top of it (spec.md §4.5, §4.6).

mod codec;
mod raw;
mod stub;
mod waiting;

pub use codec::{DecodeReturn, EncodeArgs};
pub use raw::{ClientConfig, RawClientStub};
pub use stub::ClientStub;
pub use waiting::WaitingManager;
