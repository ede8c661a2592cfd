//! nRF24L01(+) 寄存器级驱动
//!
//! 只依赖 embedded-hal 的阻塞式SPI、两个输出引脚（CE、CSN）和微秒延时，
//! 行为与常用的 RF24 库保持一致，两端可以混用。
//!
//! ```text
//! MCU              nRF24L01
//! -----+          +-----
//! MOSI |<-------->| MOSI
//! MISO |<-------->| MISO
//! SCK  |<-------->| SCK
//! CSN  |<-------->| CSN
//! CE   |<-------->| CE
//! -----+          +-----
//! ```

use core::fmt;

use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use crate::hal::RadioDevice;
use crate::link::{CrcLength, DataRate, PaLevel, RadioAddress, ADDRESS_WIDTH};
use crate::link::config::MAX_CHANNEL;

/// 硬件FIFO每帧最多32字节
pub const MAX_FRAME_LEN: usize = 32;

/// 等待发送结果的超时时间
const WRITE_TIMEOUT_US: u32 = 95_000;
const WRITE_POLL_US: u32 = 100;

/// 掉电到待机的启动时间
const POWER_UP_DELAY_US: u32 = 5_000;

/// CE 高电平最短保持时间为10us
const CE_PULSE_US: u32 = 15;

const TX_SETTLE_US: u32 = 100;

mod register {
    pub const CONFIG: u8 = 0x00;
    pub const EN_AA: u8 = 0x01;
    pub const EN_RXADDR: u8 = 0x02;
    pub const SETUP_AW: u8 = 0x03;
    pub const SETUP_RETR: u8 = 0x04;
    pub const RF_CH: u8 = 0x05;
    pub const RF_SETUP: u8 = 0x06;
    pub const STATUS: u8 = 0x07;
    pub const RX_ADDR_P0: u8 = 0x0A;
    pub const RX_ADDR_P1: u8 = 0x0B;
    pub const TX_ADDR: u8 = 0x10;
    pub const RX_PW_P0: u8 = 0x11;
    pub const FIFO_STATUS: u8 = 0x17;
    pub const DYNPD: u8 = 0x1C;
    pub const FEATURE: u8 = 0x1D;
}

mod command {
    pub const R_REGISTER: u8 = 0x00;
    pub const W_REGISTER: u8 = 0x20;
    pub const R_RX_PAYLOAD: u8 = 0x61;
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    pub const FLUSH_TX: u8 = 0xE1;
    pub const FLUSH_RX: u8 = 0xE2;
    pub const NOP: u8 = 0xFF;
}

// CONFIG
const EN_CRC: u8 = 1 << 3;
const CRCO: u8 = 1 << 2;
const PWR_UP: u8 = 1 << 1;
const PRIM_RX: u8 = 1 << 0;

// STATUS
const RX_DR: u8 = 1 << 6;
const TX_DS: u8 = 1 << 5;
const MAX_RT: u8 = 1 << 4;

// FIFO_STATUS
const RX_EMPTY: u8 = 1 << 0;

// RF_SETUP
const RF_DR_LOW: u8 = 1 << 5;
const RF_DR_HIGH: u8 = 1 << 3;
const RF_PWR_MASK: u8 = 0b0000_0110;
const LNA_HCURR: u8 = 1 << 0;

const PIPE_COUNT: u8 = 6;

/// 驱动错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nrf24Error<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
    /// 模块未响应（MISO 读回全0或全1）
    NotResponding,
    InvalidPipe(u8),
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for Nrf24Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nrf24Error::Spi(e) => write!(f, "spi bus error: {:?}", e),
            Nrf24Error::Pin(e) => write!(f, "gpio error: {:?}", e),
            Nrf24Error::NotResponding => write!(f, "nRF24L01 not responding"),
            Nrf24Error::InvalidPipe(pipe) => write!(f, "invalid data pipe {}", pipe),
        }
    }
}

pub struct Nrf24<SPI, CE, CSN, D> {
    spi: SPI,
    ce: CE,
    csn: CSN,
    delay: D,
    payload_size: u8,
    address_width: u8,
}

impl<SPI, CE, CSN, D> Nrf24<SPI, CE, CSN, D>
where
    SPI: Transfer<u8>,
    SPI::Error: fmt::Debug,
    CE: OutputPin,
    CE::Error: fmt::Debug,
    CSN: OutputPin<Error = CE::Error>,
    D: DelayUs<u32>,
{
    pub fn new(spi: SPI, ce: CE, csn: CSN, delay: D) -> Self {
        Self {
            spi,
            ce,
            csn,
            delay,
            payload_size: MAX_FRAME_LEN as u8,
            address_width: ADDRESS_WIDTH as u8,
        }
    }

    /// 归还总线和引脚
    pub fn release(self) -> (SPI, CE, CSN, D) {
        (self.spi, self.ce, self.csn, self.delay)
    }

    /// 执行一次SPI事务，返回状态寄存器
    fn transfer(&mut self, buf: &mut [u8]) -> Result<u8, Nrf24Error<SPI::Error, CE::Error>> {
        self.csn.set_low().map_err(Nrf24Error::Pin)?;
        let result = self.spi.transfer(buf).map(|_| ());
        let release = self.csn.set_high();

        result.map_err(Nrf24Error::Spi)?;
        release.map_err(Nrf24Error::Pin)?;
        Ok(buf[0])
    }

    fn command(&mut self, cmd: u8) -> Result<u8, Nrf24Error<SPI::Error, CE::Error>> {
        let mut buf = [cmd];
        self.transfer(&mut buf)
    }

    fn status(&mut self) -> Result<u8, Nrf24Error<SPI::Error, CE::Error>> {
        self.command(command::NOP)
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Nrf24Error<SPI::Error, CE::Error>> {
        let mut buf = [command::R_REGISTER | reg, command::NOP];
        self.transfer(&mut buf)?;
        Ok(buf[1])
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        let mut buf = [command::W_REGISTER | reg, value];
        self.transfer(&mut buf)?;
        Ok(())
    }

    fn update_register(
        &mut self,
        reg: u8,
        f: impl FnOnce(u8) -> u8,
    ) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        let value = self.read_register(reg)?;
        self.write_register(reg, f(value))
    }

    /// 地址低字节先发
    fn write_address(&mut self, reg: u8, address: &RadioAddress) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        let width = self.address_width as usize;
        let mut buf = [0u8; ADDRESS_WIDTH + 1];
        buf[0] = command::W_REGISTER | reg;
        buf[1..=width].copy_from_slice(&address.0[..width]);
        self.transfer(&mut buf[..=width])?;
        Ok(())
    }

    fn clear_status(&mut self) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        self.write_register(register::STATUS, RX_DR | TX_DS | MAX_RT)
    }

    fn set_ce(&mut self, high: bool) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        if high {
            self.ce.set_high().map_err(Nrf24Error::Pin)
        } else {
            self.ce.set_low().map_err(Nrf24Error::Pin)
        }
    }

    /// 等待 TX_DS 或 MAX_RT，超时视为发送失败
    fn wait_for_transmit(&mut self) -> Result<u8, Nrf24Error<SPI::Error, CE::Error>> {
        let mut waited = 0;
        loop {
            let status = self.status()?;
            if status & (TX_DS | MAX_RT) != 0 || waited >= WRITE_TIMEOUT_US {
                return Ok(status);
            }
            self.delay.delay_us(WRITE_POLL_US);
            waited += WRITE_POLL_US;
        }
    }
}

impl<SPI, CE, CSN, D> RadioDevice for Nrf24<SPI, CE, CSN, D>
where
    SPI: Transfer<u8>,
    SPI::Error: fmt::Debug,
    CE: OutputPin,
    CE::Error: fmt::Debug,
    CSN: OutputPin<Error = CE::Error>,
    D: DelayUs<u32>,
{
    type Error = Nrf24Error<SPI::Error, CE::Error>;

    const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_LEN;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.set_ce(false)?;
        self.csn.set_high().map_err(Nrf24Error::Pin)?;
        self.delay.delay_us(POWER_UP_DELAY_US);

        self.write_register(register::CONFIG, EN_CRC | CRCO)?;
        self.set_retries(5, 15)?;
        self.set_data_rate(DataRate::Mbps1)?;

        // 没有接模块时 MISO 读回全0或全1
        let setup = self.read_register(register::RF_SETUP)?;
        if setup == 0x00 || setup == 0xFF {
            return Err(Nrf24Error::NotResponding);
        }

        self.write_register(register::DYNPD, 0)?;
        self.write_register(register::FEATURE, 0)?;
        self.write_register(register::EN_AA, 0x3F)?;
        self.write_register(register::EN_RXADDR, 0x03)?;
        self.set_payload_size(MAX_FRAME_LEN)?;
        self.set_address_width(ADDRESS_WIDTH as u8)?;
        self.set_channel(76)?;
        self.clear_status()?;
        self.command(command::FLUSH_RX)?;
        self.command(command::FLUSH_TX)?;
        self.write_register(register::CONFIG, EN_CRC | CRCO)?;
        self.power_up()
    }

    fn set_crc_length(&mut self, length: CrcLength) -> Result<(), Self::Error> {
        let bits = match length {
            CrcLength::Disabled => 0,
            CrcLength::Crc8 => EN_CRC,
            CrcLength::Crc16 => EN_CRC | CRCO,
        };
        self.update_register(register::CONFIG, |config| (config & !(EN_CRC | CRCO)) | bits)
    }

    fn stop_listening(&mut self) -> Result<(), Self::Error> {
        self.set_ce(false)?;
        self.delay.delay_us(TX_SETTLE_US);
        self.update_register(register::CONFIG, |config| config & !PRIM_RX)?;
        // 发送端通过0号管道接收回执
        self.update_register(register::EN_RXADDR, |pipes| pipes | 1)
    }

    fn set_retries(&mut self, delay: u8, count: u8) -> Result<(), Self::Error> {
        self.write_register(register::SETUP_RETR, (delay.min(15) << 4) | count.min(15))
    }

    fn set_auto_ack(&mut self, enable: bool) -> Result<(), Self::Error> {
        self.write_register(register::EN_AA, if enable { 0x3F } else { 0x00 })
    }

    fn set_address_width(&mut self, width: u8) -> Result<(), Self::Error> {
        let width = width.clamp(3, ADDRESS_WIDTH as u8);
        self.write_register(register::SETUP_AW, width - 2)?;
        self.address_width = width;
        Ok(())
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.write_register(register::RF_CH, channel.min(MAX_CHANNEL))
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error> {
        let bits = match rate {
            DataRate::Kbps250 => RF_DR_LOW,
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => RF_DR_HIGH,
        };
        self.update_register(register::RF_SETUP, |setup| (setup & !(RF_DR_LOW | RF_DR_HIGH)) | bits)
    }

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), Self::Error> {
        let power = match level {
            PaLevel::Min => 0,
            PaLevel::Low => 1,
            PaLevel::High => 2,
            PaLevel::Max => 3,
        };
        self.update_register(register::RF_SETUP, |setup| {
            (setup & !(RF_PWR_MASK | LNA_HCURR)) | (power << 1) | LNA_HCURR
        })
    }

    fn power_up(&mut self) -> Result<(), Self::Error> {
        let config = self.read_register(register::CONFIG)?;
        if config & PWR_UP == 0 {
            self.write_register(register::CONFIG, config | PWR_UP)?;
            self.delay.delay_us(POWER_UP_DELAY_US);
        }
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), Self::Error> {
        self.set_ce(false)?;
        self.update_register(register::CONFIG, |config| config & !PWR_UP)
    }

    fn set_payload_size(&mut self, size: usize) -> Result<(), Self::Error> {
        let clamped = size.clamp(1, MAX_FRAME_LEN);
        if clamped != size {
            log::warn!("payload size {} exceeds the {} byte FIFO, clamped", size, MAX_FRAME_LEN);
        }

        self.payload_size = clamped as u8;
        for pipe in 0..PIPE_COUNT {
            self.write_register(register::RX_PW_P0 + pipe, self.payload_size)?;
        }
        Ok(())
    }

    fn payload_size(&self) -> usize {
        self.payload_size as usize
    }

    fn open_writing_pipe(&mut self, address: &RadioAddress) -> Result<(), Self::Error> {
        // 0号管道与发送地址一致才能收到回执
        self.write_address(register::RX_ADDR_P0, address)?;
        self.write_address(register::TX_ADDR, address)?;
        self.write_register(register::RX_PW_P0, self.payload_size)
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &RadioAddress) -> Result<(), Self::Error> {
        if pipe >= PIPE_COUNT {
            return Err(Nrf24Error::InvalidPipe(pipe));
        }

        // 2~5号管道只有最低字节可配置
        if pipe < 2 {
            let reg = if pipe == 0 { register::RX_ADDR_P0 } else { register::RX_ADDR_P1 };
            self.write_address(reg, address)?;
        } else {
            self.write_register(register::RX_ADDR_P0 + pipe, address.0[0])?;
        }
        self.write_register(register::RX_PW_P0 + pipe, self.payload_size)?;
        self.update_register(register::EN_RXADDR, |pipes| pipes | (1 << pipe))
    }

    fn start_listening(&mut self) -> Result<(), Self::Error> {
        self.power_up()?;
        self.update_register(register::CONFIG, |config| config | PRIM_RX)?;
        self.clear_status()?;
        // 0号管道只用于发送端接收回执
        self.update_register(register::EN_RXADDR, |pipes| pipes & !1)?;
        self.set_ce(true)
    }

    fn write(&mut self, payload: &[u8]) -> Result<bool, Self::Error> {
        let len = self.payload_size as usize;
        let copied = payload.len().min(len);

        // 不足负载大小的部分补零
        let mut frame = [0u8; MAX_FRAME_LEN + 1];
        frame[0] = command::W_TX_PAYLOAD;
        frame[1..=copied].copy_from_slice(&payload[..copied]);
        self.transfer(&mut frame[..=len])?;

        self.set_ce(true)?;
        self.delay.delay_us(CE_PULSE_US);
        let status = self.wait_for_transmit()?;
        self.set_ce(false)?;
        self.clear_status()?;

        if status & TX_DS == 0 {
            // 重传次数用尽（或超时），丢弃这一帧
            self.command(command::FLUSH_TX)?;
            return Ok(false);
        }
        Ok(true)
    }

    fn available(&mut self) -> Result<bool, Self::Error> {
        let fifo = self.read_register(register::FIFO_STATUS)?;
        Ok(fifo & RX_EMPTY == 0)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        let len = self.payload_size as usize;
        let mut frame = [command::NOP; MAX_FRAME_LEN + 1];
        frame[0] = command::R_RX_PAYLOAD;
        self.transfer(&mut frame[..=len])?;
        self.write_register(register::STATUS, RX_DR)?;

        let copied = buffer.len().min(len);
        buffer[..copied].copy_from_slice(&frame[1..=copied]);
        Ok(copied)
    }

    fn is_chip_connected(&mut self) -> Result<bool, Self::Error> {
        let setup = self.read_register(register::SETUP_AW)?;
        Ok(setup == self.address_width - 2)
    }
}
