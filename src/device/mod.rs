//! Discovery and control of the bound smart-light device

pub mod discovery;
pub mod protocol;
pub mod session;

pub use protocol::{Command, TransitionMode};
pub use session::{DeviceSession, SessionHandle};
