//! External recognition engine: process execution, scratch files,
//! invocation and output cleanup.

pub mod invoker;
pub mod runner;
pub mod sanitize;
pub mod scratch;

pub use invoker::{TranscriptionInvoker, TranscriptionRequest};
pub use runner::{CommandRunner, EngineOutput, MockCommandRunner, SystemCommandRunner};
pub use scratch::ScratchFile;
