pub mod checksum;

pub use checksum::{frame_crc, verify_frame_crc};
