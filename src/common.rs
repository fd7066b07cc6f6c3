//! The closable [`Channel`] primitive and the wire records/control commands
//! carried over it (spec.md §3, §4.1).

mod channel;
mod control;
mod packet;

pub use channel::{Channel, ChannelClosed};
pub use control::{FilterCmd, Id, MethodTag, SleepCmd, SHUTDOWN_METHOD_TAG};
pub use packet::{Request, Response, Status};
