/// Top-level encoder and decoder
pub mod receiver;
pub mod sender;

pub use receiver::{DecodeOutput, DecoderConfig, Diagnostics, DrmReceiver};
pub use sender::{DrmSender, EncoderConfig};
