// Forward error correction: the punctured convolutional code and the
// frequency/time cell interleavers.

pub mod conv;
pub mod interleave;

pub use conv::{conv_encode, viterbi_decode};
