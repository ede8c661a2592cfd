use core::fmt;

use common::hal::RadioDevice;
use common::link::{AlertMessage, LinkRadio};

/// 接收缓冲区大小
pub const RX_BUFFER_SIZE: usize = 64;

/// 收到的一帧原始数据，未写入部分为0
#[derive(Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    buffer: [u8; RX_BUFFER_SIZE],
    len: usize,
}

impl ReceivedFrame {
    /// 模块实际写入的字节
    pub fn payload(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// 完整的接收缓冲区（含0填充）
    pub fn buffer(&self) -> &[u8; RX_BUFFER_SIZE] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn alert(&self) -> Option<AlertMessage<'_>> {
        AlertMessage::parse(self.payload())
    }
}

impl fmt::Debug for ReceivedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceivedFrame")
            .field("payload", &self.payload())
            .finish()
    }
}

/// 单次轮询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// 模块未连接，本次没有读取
    Offline,
    /// 没有待读取的数据
    Idle,
    Received(ReceivedFrame),
}

/// 接收端，借用已配置好的无线模块
pub struct Receiver<'a, R: RadioDevice> {
    link: &'a mut LinkRadio<R>,
    received: u32,
}

impl<'a, R: RadioDevice> Receiver<'a, R> {
    pub fn new(link: &'a mut LinkRadio<R>) -> Self {
        Self { link, received: 0 }
    }

    /// 已收到的帧数量
    pub fn received(&self) -> u32 {
        self.received
    }

    /// 非阻塞地检查一次：有数据就读取一帧，否则立即返回
    pub fn poll_once(&mut self) -> PollOutcome {
        let radio = self.link.get_radio();

        // 掉线后不重连，只报告离线
        if !matches!(radio.is_chip_connected(), Ok(true)) {
            log::warn!("Radio offline");
            return PollOutcome::Offline;
        }

        match radio.available() {
            Ok(true) => {}
            Ok(false) => return PollOutcome::Idle,
            Err(e) => {
                log::warn!("Radio device status read failed: {:?}", e);
                return PollOutcome::Idle;
            }
        }

        let mut buffer = [0u8; RX_BUFFER_SIZE];
        let len = match radio.read(&mut buffer) {
            Ok(len) => len,
            Err(e) => {
                log::warn!("Radio device read failed: {:?}", e);
                return PollOutcome::Idle;
            }
        };

        let frame = ReceivedFrame { buffer, len };
        self.received = self.received.wrapping_add(1);
        report(&frame);
        PollOutcome::Received(frame)
    }

    /// 持续轮询，直到 `keep_running` 返回 false
    pub fn run_while(&mut self, mut keep_running: impl FnMut() -> bool) {
        while keep_running() {
            self.poll_once();
        }
    }
}

/// 输出收到的原始数据，并尝试解析门铃消息
fn report(frame: &ReceivedFrame) {
    let payload = frame.payload();
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    match core::str::from_utf8(&payload[..end]) {
        Ok(text) => log::info!("Radio received: {}", text),
        Err(_) => log::info!("Radio received: {:02x?}", payload),
    }

    match frame.alert() {
        Some(message) if message.is_alert() && message.is_from_source() => {
            log::info!("Doorbell alert from {}", message.sender);
        }
        Some(message) => {
            log::warn!("Unknown command '{}' from {}", message.command, message.sender);
        }
        None => log::warn!("Malformed alert message ({} bytes)", payload.len()),
    }
}
