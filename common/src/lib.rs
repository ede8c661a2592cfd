#![cfg_attr(not(feature = "simulator"), no_std)]

pub mod link;
pub mod hal;
pub mod utils;

// 重新导出核心类型
pub use link::{AlertMessage, DeviceRole, LinkError, LinkRadio, RadioAddress, RadioLinkConfig};
pub use hal::{PowerControl, RadioDevice};
pub use utils::{frame_crc, verify_frame_crc};
