use std::marker::PhantomData;
use std::time::Duration;

use crate::common::MethodTag;
use crate::endpoint::ServerEndpoint;
use crate::error::CallError;

use super::codec::{DecodeReturn, EncodeArgs};
use super::raw::{ClientConfig, RawClientStub};

/// The generated, typed caller-side façade over a [`RawClientStub`]
/// (spec.md §4.6), parameterized by the user's service trait `S` purely for
/// documentation/type-safety at call sites — `S` carries no data or
/// behavior of its own here, since the actual method dispatch table lives
/// in the reflection layer that produces one `ClientStub<S>` method per
/// service method.
///
/// Grounded on `distant-net`'s `Client<T, U>` wrapping `UntypedChannel`
/// (spec.md's expansion, §11.1).
pub struct ClientStub<S> {
    raw: RawClientStub,
    _service: PhantomData<fn() -> S>,
}

impl<S> ClientStub<S> {
    pub fn new(server: ServerEndpoint, config: ClientConfig) -> Self {
        Self {
            raw: RawClientStub::new(server, config),
            _service: PhantomData,
        }
    }

    pub fn raw(&self) -> &RawClientStub {
        &self.raw
    }

    /// Invokes `tag`, encoding `args` and decoding the return value with the
    /// reflection/codec collaborator's `EncodeArgs`/`DecodeReturn` impls for
    /// `A`/`R`. Intended to be called (awaited) from generated per-method
    /// wrappers; works equally from a handler making a re-entrant call
    /// (spec.md §9) since it just forwards to [`RawClientStub::call`].
    pub async fn invoke<A, R>(&self, tag: impl Into<MethodTag>, args: A) -> Result<R, CallError>
    where
        A: EncodeArgs,
        R: DecodeReturn,
    {
        let response = self.raw.call(tag, args.encode_args()).await?;
        R::decode_return(&response.data).map_err(CallError::failed)
    }

    /// Same as [`invoke`](Self::invoke), but with an explicit per-call
    /// timeout overriding this stub's [`ClientConfig::default_timeout`].
    pub async fn invoke_with_timeout<A, R>(
        &self,
        tag: impl Into<MethodTag>,
        args: A,
        timeout: Duration,
    ) -> Result<R, CallError>
    where
        A: EncodeArgs,
        R: DecodeReturn,
    {
        let response = self.raw.call_with_timeout(tag, args.encode_args(), timeout).await?;
        R::decode_return(&response.data).map_err(CallError::failed)
    }

    /// Blocking counterpart of [`invoke`](Self::invoke) for callers on a
    /// bare OS thread with no ambient `Scheduler` (spec.md §4.6 step 3).
    pub fn invoke_blocking<A, R>(&self, tag: impl Into<MethodTag>, args: A) -> Result<R, CallError>
    where
        A: EncodeArgs,
        R: DecodeReturn,
    {
        let response = self.raw.call_blocking(tag, args.encode_args())?;
        R::decode_return(&response.data).map_err(CallError::failed)
    }

    pub fn close(&self) {
        self.raw.close();
    }
}
