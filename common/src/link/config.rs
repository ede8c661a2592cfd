//! 两端共享的链路参数。
//!
//! nRF24L01 两个节点能够通信的前提：
//!  1. 使用相同的CRC配置
//!  2. 使用相同的地址宽度
//!  3. 使用相同的通信频道
//!  4. 使用相同的通信速率
//!
//! 任何一项不一致都不会产生错误，接收端只是永远收不到数据包。

/// 链路参数版本，修改 [`RadioLinkConfig::COBELL`] 时递增
pub const LINK_PROFILE_VERSION: u8 = 1;

/// 自动重传的单位间隔
pub const RETRY_DELAY_STEP_US: u32 = 250;

/// 2.4GHz 频段起始频率
pub const BASE_FREQUENCY_MHZ: u16 = 2400;

pub const MAX_CHANNEL: u8 = 125;

/// CRC长度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcLength {
    Disabled,
    Crc8,
    Crc16,
}

impl CrcLength {
    /// 帧尾CRC占用的字节数
    pub fn width_bytes(&self) -> usize {
        match self {
            CrcLength::Disabled => 0,
            CrcLength::Crc8 => 1,
            CrcLength::Crc16 => 2,
        }
    }
}

/// 空中速率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    Kbps250,
    Mbps1,
    Mbps2,
}

/// 发射功率
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaLevel {
    /// -18dBm
    Min,
    /// -12dBm
    Low,
    /// -6dBm
    High,
    /// 0dBm
    Max,
}

/// 链路配置，两端必须逐位一致
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioLinkConfig {
    pub crc_length: CrcLength,
    /// 地址宽度（字节）
    pub address_width: u8,
    /// 频道，实际频率为 2400 + channel MHz
    pub channel: u8,
    pub data_rate: DataRate,
    pub pa_level: PaLevel,
    /// 重试间隔，单位为250us，实际间隔为 (retry_delay + 1) * 250us
    pub retry_delay: u8,
    /// 重试次数
    pub retry_count: u8,
    pub auto_ack: bool,
}

impl RadioLinkConfig {
    /// 门铃两端使用的链路配置
    pub const COBELL: Self = Self {
        crc_length: CrcLength::Crc16,
        address_width: 5,
        channel: 0,
        data_rate: DataRate::Mbps1,
        pa_level: PaLevel::Max,
        retry_delay: 5,
        retry_count: 3,
        auto_ack: true,
    };

    /// 两次重传之间的间隔
    pub fn retry_delay_us(&self) -> u32 {
        (self.retry_delay as u32 + 1) * RETRY_DELAY_STEP_US
    }

    pub fn channel_frequency_mhz(&self) -> u16 {
        BASE_FREQUENCY_MHZ + self.channel as u16
    }

    /// 判断两端配置是否能够互通（发射功率不影响互通）
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.crc_length == other.crc_length
            && self.address_width == other.address_width
            && self.channel == other.channel
            && self.data_rate == other.data_rate
    }
}

impl Default for RadioLinkConfig {
    fn default() -> Self {
        Self::COBELL
    }
}
