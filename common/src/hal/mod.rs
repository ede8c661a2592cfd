pub mod nrf24;
#[cfg(feature = "simulator")]
pub mod simulator;

use crate::link::{CrcLength, DataRate, PaLevel, RadioAddress};

/// 无线模块抽象（nRF24L01 的库接口）
pub trait RadioDevice {
    type Error: core::fmt::Debug;

    /// 单帧最大负载
    const MAX_PAYLOAD_SIZE: usize;

    /// 在控制总线上初始化模块，模块无响应时返回错误
    fn begin(&mut self) -> Result<(), Self::Error>;

    fn set_crc_length(&mut self, length: CrcLength) -> Result<(), Self::Error>;

    /// 关闭接收，进入发送模式
    fn stop_listening(&mut self) -> Result<(), Self::Error>;

    /// 配置自动重传：间隔 (delay + 1) * 250us，重试 count 次
    fn set_retries(&mut self, delay: u8, count: u8) -> Result<(), Self::Error>;

    fn set_auto_ack(&mut self, enable: bool) -> Result<(), Self::Error>;

    fn set_address_width(&mut self, width: u8) -> Result<(), Self::Error>;

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error>;

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error>;

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), Self::Error>;

    fn power_up(&mut self) -> Result<(), Self::Error>;

    fn power_down(&mut self) -> Result<(), Self::Error>;

    /// 设置静态负载大小，超出 `MAX_PAYLOAD_SIZE` 时截断
    fn set_payload_size(&mut self, size: usize) -> Result<(), Self::Error>;

    fn payload_size(&self) -> usize;

    fn open_writing_pipe(&mut self, address: &RadioAddress) -> Result<(), Self::Error>;

    fn open_reading_pipe(&mut self, pipe: u8, address: &RadioAddress) -> Result<(), Self::Error>;

    /// 开始接收
    fn start_listening(&mut self) -> Result<(), Self::Error>;

    /// 发送一帧，返回是否收到硬件回执（未开启自动回执时表示已发出）
    fn write(&mut self, payload: &[u8]) -> Result<bool, Self::Error>;

    /// 接收FIFO中是否有数据，不阻塞
    fn available(&mut self) -> Result<bool, Self::Error>;

    /// 读取一帧到缓冲区，返回复制的字节数
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    fn is_chip_connected(&mut self) -> Result<bool, Self::Error>;
}

/// 休眠模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepMode {
    Idle,
    /// 掉电模式，只能被外部中断唤醒
    PowerDown,
}

/// MCU 低功耗控制
pub trait PowerControl {
    type Error: core::fmt::Debug;

    fn set_sleep_mode(&mut self, mode: SleepMode);

    /// 关闭全局中断
    fn disable_interrupts(&mut self);

    /// 开启全局中断
    fn enable_interrupts(&mut self);

    fn sleep_enable(&mut self);

    fn sleep_disable(&mut self);

    /// 执行休眠指令，直到被外部事件（门铃按键中断）唤醒才返回
    fn sleep_cpu(&mut self) -> Result<(), Self::Error>;
}
