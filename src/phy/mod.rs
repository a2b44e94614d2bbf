// Channel framing layer: CRC gates, constellations, the frame slot grid
// and the FAC/SDC/MSC record formats.

pub mod crc;
pub mod frame;
pub mod qam;
pub mod slots;

pub use frame::{FacParams, Segment};
pub use slots::{SlotKind, SlotMap};
