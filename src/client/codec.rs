//! The seam a generated, typed [`ClientStub`](super::ClientStub) uses to
//! reach the external payload codec (spec.md §1, §6): this crate only
//! requires `encode(args) -> bytes` and `decode(bytes) -> value`. The actual
//! serialization format is entirely the reflection/codec collaborator's
//! choice; these traits exist purely so `ClientStub<S>` can be generic over
//! argument/return types without this crate picking a wire format for them.

/// Encodes an argument tuple (or a single argument) into the bytes a
/// [`Request`](crate::common::Request) carries.
pub trait EncodeArgs {
    fn encode_args(&self) -> Vec<u8>;
}

/// Decodes a method's return value from the bytes a successful
/// [`Response`](crate::common::Response) carries.
pub trait DecodeReturn: Sized {
    fn decode_return(bytes: &[u8]) -> Result<Self, String>;
}

impl EncodeArgs for () {
    fn encode_args(&self) -> Vec<u8> {
        Vec::new()
    }
}

impl DecodeReturn for () {
    fn decode_return(_bytes: &[u8]) -> Result<Self, String> {
        Ok(())
    }
}
