pub mod config;
pub mod error;
pub mod radio;

pub use config::{CrcLength, DataRate, PaLevel, RadioLinkConfig, LINK_PROFILE_VERSION};
pub use error::LinkError;
pub use radio::LinkRadio;

use core::fmt;

/// 地址宽度：40bits, 5bytes
pub const ADDRESS_WIDTH: usize = 5;

/// 发送者标识
pub const SOURCE_IDENTIFIER: &str = "com.cobox.iot.cobell.source";
pub const SINK_IDENTIFIER: &str = "com.cobox.iot.cobell.sink";

/// 门铃指令
pub const ALERT_COMMAND: &str = "alert";

/// 门铃消息，格式："[发送者],[指令]"，末尾保留一个NUL字节
pub const ALERT_MESSAGE: &[u8] = b"com.cobox.iot.cobell.source,alert\0";

/// 发送负载大小，必须与消息长度严格一致
pub const ALERT_PAYLOAD_SIZE: usize = 34;

const _: () = assert!(ALERT_MESSAGE.len() == ALERT_PAYLOAD_SIZE);

/// 管道地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioAddress(pub [u8; ADDRESS_WIDTH]);

impl RadioAddress {
    /// com.cobox.iot.cobell.source -> CoBellSouRCe -> CBSRC
    pub const SOURCE: Self = Self(*b"CBSRC");
    /// com.cobox.iot.cobell.sink -> CoBellSiNK -> CBSNK
    pub const SINK: Self = Self(*b"CBSNK");

    pub const fn new(address: [u8; ADDRESS_WIDTH]) -> Self {
        Self(address)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_WIDTH] {
        &self.0
    }
}

impl fmt::Display for RadioAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

/// 节点角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceRole {
    /// 门铃按钮，电池供电，只发送
    Source,
    /// 门铃主机，只接收
    Sink,
}

impl DeviceRole {
    pub fn own_address(&self) -> RadioAddress {
        match self {
            DeviceRole::Source => RadioAddress::SOURCE,
            DeviceRole::Sink => RadioAddress::SINK,
        }
    }

    pub fn peer_address(&self) -> RadioAddress {
        match self {
            DeviceRole::Source => RadioAddress::SINK,
            DeviceRole::Sink => RadioAddress::SOURCE,
        }
    }
}

/// 解析后的门铃消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertMessage<'a> {
    pub sender: &'a str,
    pub command: &'a str,
}

impl<'a> AlertMessage<'a> {
    /// 从接收缓冲区解析消息，忽略NUL填充
    pub fn parse(raw: &'a [u8]) -> Option<Self> {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let text = core::str::from_utf8(&raw[..end]).ok()?;
        let (sender, command) = text.split_once(',')?;

        if sender.is_empty() || command.is_empty() || command.contains(',') {
            return None;
        }

        Some(Self { sender, command })
    }

    pub fn is_alert(&self) -> bool {
        self.command == ALERT_COMMAND
    }

    pub fn is_from_source(&self) -> bool {
        self.sender == SOURCE_IDENTIFIER
    }
}
