//! A harness for testing distributed services without any real network.
//!
//! A user-declared service interface is instantiated many times over as
//! independent in-process actors, each on its own OS thread with its own
//! cooperative task [`Scheduler`]. Callers address an actor through an
//! [`Endpoint`] and invoke it through a [`ClientStub`](client::ClientStub)
//! as though it were a remote peer. A control plane layered on the same
//! endpoints lets a test force a peer to sleep, drop traffic, or reject a
//! specific method, simulating latency, outage, and partial failure without
//! any network hardware.
//!
//! The pieces that make this possible live in [`common`] (the closable
//! [`Channel`](common::Channel) and the wire records), [`scheduler`] (the
//! cooperative task runner), [`endpoint`] (the addressable handle), [`server`]
//! (the per-actor event loop), and [`client`] (the correlator and the
//! caller-side façade). [`actor`] wires all of the above into the lifecycle
//! described by the spec: spawn, call, control, shut down.
//!
//! Two collaborators are intentionally external to this crate: a reflection
//! layer that turns a user service trait into a [`MethodTag`](common::MethodTag)
//! -> handler table, and a payload codec that turns argument/return values
//! into bytes. Nothing in this crate inspects those bytes.

pub mod actor;
pub mod client;
pub mod common;
pub mod endpoint;
pub mod error;
pub mod scheduler;
pub mod server;

pub use actor::{Actor, ActorBuilder};
pub use client::{ClientConfig, ClientStub, DecodeReturn, EncodeArgs, RawClientStub, WaitingManager};
pub use common::{Channel, FilterCmd, Id, MethodTag, Request, Response, SleepCmd, Status};
pub use endpoint::{ClientEndpoint, ServerEndpoint};
pub use error::CallError;
pub use scheduler::{Condition, Scheduler};
pub use server::{HandlerResult, ReplyHandle, RequestCtx, Server, ServerLoop};
