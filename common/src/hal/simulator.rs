use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crossbeam::channel::{unbounded, Receiver, Sender};
use heapless::Deque;
use zerocopy::{AsBytes, FromBytes};

use crate::hal::{PowerControl, RadioDevice, SleepMode};
use crate::link::config::MAX_CHANNEL;
use crate::link::{CrcLength, DataRate, PaLevel, RadioAddress, ADDRESS_WIDTH};
use crate::utils::{frame_crc, verify_frame_crc};

/// 模拟器不受32字节FIFO限制，帧长上限与接收缓冲区一致
pub const SIM_MAX_PAYLOAD: usize = 64;

/// 硬件接收FIFO深度
const RX_FIFO_DEPTH: usize = 3;

const DEFAULT_PAYLOAD_SIZE: usize = 32;

/// 已记录的空中帧数量上限
const AIR_LOG_CAPACITY: usize = 64;

type Payload = heapless::Vec<u8, SIM_MAX_PAYLOAD>;

/// 模拟器错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorError {
    /// 共享信道被破坏（持锁线程崩溃）
    RadioError,
    /// 模块未连接
    NotResponding,
    InvalidPipe(u8),
    /// 所有唤醒源都已关闭，永远不会被唤醒
    WakeSourceClosed,
    /// 关中断状态下休眠
    SleepWithoutInterrupts,
}

impl std::fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulatorError::RadioError => write!(f, "simulated ether is poisoned"),
            SimulatorError::NotResponding => write!(f, "simulated radio is disconnected"),
            SimulatorError::InvalidPipe(pipe) => write!(f, "invalid data pipe {}", pipe),
            SimulatorError::WakeSourceClosed => write!(f, "no wake source left"),
            SimulatorError::SleepWithoutInterrupts => write!(f, "sleep entered with interrupts disabled"),
        }
    }
}

impl std::error::Error for SimulatorError {}

/// 空中帧头
#[derive(Debug, Clone, Copy, AsBytes, FromBytes)]
#[repr(C)]
struct FrameHeader {
    channel: u8,
    data_rate: u8,
    address_width: u8,
    address: [u8; ADDRESS_WIDTH],
    length: u8,
}

const HEADER_LEN: usize = core::mem::size_of::<FrameHeader>();

fn rate_code(rate: DataRate) -> u8 {
    match rate {
        DataRate::Kbps250 => 0,
        DataRate::Mbps1 => 1,
        DataRate::Mbps2 => 2,
    }
}

/// 模拟模块的寄存器状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRegisters {
    pub crc_length: CrcLength,
    pub address_width: u8,
    pub channel: u8,
    pub data_rate: DataRate,
    pub pa_level: PaLevel,
    pub retry_delay: u8,
    pub retry_count: u8,
    pub auto_ack: bool,
    pub powered: bool,
    pub listening: bool,
    pub payload_size: usize,
    pub tx_address: RadioAddress,
    pub rx_pipes: [Option<RadioAddress>; 6],
    /// 已开启的接收管道位图
    pub enabled_pipes: u8,
}

impl SimRegisters {
    /// 上电复位值
    fn power_on_reset() -> Self {
        let mut rx_pipes = [None; 6];
        rx_pipes[0] = Some(RadioAddress([0xE7; ADDRESS_WIDTH]));
        rx_pipes[1] = Some(RadioAddress([0xC2; ADDRESS_WIDTH]));

        Self {
            crc_length: CrcLength::Crc8,
            address_width: ADDRESS_WIDTH as u8,
            channel: 2,
            data_rate: DataRate::Mbps2,
            pa_level: PaLevel::Max,
            retry_delay: 0,
            retry_count: 3,
            auto_ack: true,
            powered: false,
            listening: false,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            tx_address: RadioAddress([0xE7; ADDRESS_WIDTH]),
            rx_pipes,
            enabled_pipes: 0b11,
        }
    }

    /// 库初始化后的默认值
    fn library_defaults() -> Self {
        Self {
            crc_length: CrcLength::Crc16,
            channel: 76,
            data_rate: DataRate::Mbps1,
            retry_delay: 5,
            retry_count: 15,
            powered: true,
            ..Self::power_on_reset()
        }
    }

    fn matching_pipe(&self, header: &FrameHeader) -> Option<usize> {
        let width = self.address_width as usize;
        self.rx_pipes.iter().enumerate().position(|(pipe, address)| {
            self.enabled_pipes & (1 << pipe) != 0
                && address.map_or(false, |a| a.0[..width] == header.address[..width])
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    /// 发出的帧（含重传）
    pub transmissions: usize,
    pub retransmissions: usize,
    pub acknowledged: usize,
    pub received: usize,
}

struct NodeState {
    registers: SimRegisters,
    connected: bool,
    /// 初始化时读回的 RF_SETUP 无效，但寄存器写入仍然生效
    responding: bool,
    rx_fifo: Deque<Payload, RX_FIFO_DEPTH>,
    stats: SimStats,
}

impl NodeState {
    fn new() -> Self {
        Self {
            registers: SimRegisters::power_on_reset(),
            connected: true,
            responding: true,
            rx_fifo: Deque::new(),
            stats: SimStats::default(),
        }
    }

    /// 构造空中帧：帧头 + 负载 + CRC
    fn build_frame(&self, payload: &[u8]) -> Vec<u8> {
        let registers = &self.registers;
        let length = registers.payload_size;
        let header = FrameHeader {
            channel: registers.channel,
            data_rate: rate_code(registers.data_rate),
            address_width: registers.address_width,
            address: registers.tx_address.0,
            length: length as u8,
        };

        let mut frame = Vec::with_capacity(HEADER_LEN + length + 2);
        frame.extend_from_slice(header.as_bytes());

        // 静态负载：不足补零，超出截断
        let copied = payload.len().min(length);
        frame.extend_from_slice(&payload[..copied]);
        frame.resize(HEADER_LEN + length, 0);

        let crc = frame_crc(registers.crc_length, &frame);
        match registers.crc_length {
            CrcLength::Disabled => {}
            CrcLength::Crc8 => frame.push(crc as u8),
            CrcLength::Crc16 => frame.extend_from_slice(&crc.to_be_bytes()),
        }
        frame
    }

    /// 尝试接收一帧，返回是否回执
    fn receive(&mut self, frame: &[u8]) -> bool {
        let registers = &self.registers;
        if !self.connected || !registers.powered || !registers.listening {
            return false;
        }

        let header = match FrameHeader::read_from_prefix(frame) {
            Some(header) => header,
            None => return false,
        };

        // 频道、速率、地址宽度不一致时根本收不到
        if header.channel != registers.channel
            || header.data_rate != rate_code(registers.data_rate)
            || header.address_width != registers.address_width
        {
            return false;
        }

        if registers.matching_pipe(&header).is_none() {
            return false;
        }

        let length = header.length as usize;
        let body = HEADER_LEN + length;
        if length > SIM_MAX_PAYLOAD || frame.len() != body + registers.crc_length.width_bytes() {
            return false;
        }
        if !verify_frame_crc(registers.crc_length, &frame[..body], &frame[body..]) {
            return false;
        }

        let payload = match Payload::from_slice(&frame[HEADER_LEN..body]) {
            Ok(payload) => payload,
            Err(_) => return false,
        };

        // FIFO满时丢弃，不回执
        let auto_ack = registers.auto_ack;
        if self.rx_fifo.push_back(payload).is_err() {
            return false;
        }
        self.stats.received += 1;
        auto_ack
    }
}

struct EtherState {
    nodes: Vec<NodeState>,
    air_log: VecDeque<Vec<u8>>,
    frames_on_air: usize,
}

/// 共享的空中信道，用于在多个模拟节点之间传递帧
#[derive(Clone)]
pub struct SimEther {
    state: Arc<Mutex<EtherState>>,
}

impl SimEther {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EtherState {
                nodes: Vec::new(),
                air_log: VecDeque::new(),
                frames_on_air: 0,
            })),
        }
    }

    /// 接入一个新的无线模块
    pub fn attach(&self) -> SimRadio {
        let index = self
            .with_state(|state| {
                state.nodes.push(NodeState::new());
                state.nodes.len() - 1
            })
            .unwrap_or(usize::MAX);

        SimRadio {
            ether: self.clone(),
            index,
        }
    }

    /// 空中出现过的帧数量（含重传）
    pub fn frames_on_air(&self) -> usize {
        self.with_state(|state| state.frames_on_air).unwrap_or(0)
    }

    /// 最近一次发出的空中帧
    pub fn last_frame(&self) -> Option<Vec<u8>> {
        self.with_state(|state| state.air_log.back().cloned()).ok().flatten()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut EtherState) -> T) -> Result<T, SimulatorError> {
        let mut state = self.state.lock().map_err(|_| SimulatorError::RadioError)?;
        Ok(f(&mut state))
    }

    fn with_node<T>(&self, index: usize, f: impl FnOnce(&mut NodeState) -> T) -> Result<T, SimulatorError> {
        self.with_state(|state| state.nodes.get_mut(index).map(f))?
            .ok_or(SimulatorError::RadioError)
    }

    fn transmit(&self, index: usize, payload: &[u8]) -> Result<bool, SimulatorError> {
        self.with_state(|state| {
            let sender = match state.nodes.get(index) {
                Some(sender) => sender,
                None => return false,
            };
            let registers = &sender.registers;
            if !sender.connected || !registers.powered || registers.listening {
                return false;
            }

            let expects_ack = registers.auto_ack;
            let retries = registers.retry_count as usize;
            let frame = sender.build_frame(payload);

            let mut acked = false;
            for (i, node) in state.nodes.iter_mut().enumerate() {
                if i != index && node.receive(&frame) {
                    acked = true;
                }
            }

            // 没有回执时按配置次数重传；重传只计数，不会再次投递
            let attempts = if expects_ack && !acked { 1 + retries } else { 1 };
            state.frames_on_air += attempts;
            if state.air_log.len() == AIR_LOG_CAPACITY {
                state.air_log.pop_front();
            }
            state.air_log.push_back(frame);

            let stats = &mut state.nodes[index].stats;
            stats.transmissions += attempts;
            stats.retransmissions += attempts - 1;
            if acked {
                stats.acknowledged += 1;
            }

            !expects_ack || acked
        })
    }
}

impl Default for SimEther {
    fn default() -> Self {
        Self::new()
    }
}

/// 模拟无线模块
pub struct SimRadio {
    ether: SimEther,
    index: usize,
}

impl SimRadio {
    /// 获取观察/注入故障用的句柄
    pub fn probe(&self) -> SimProbe {
        SimProbe {
            ether: self.ether.clone(),
            index: self.index,
        }
    }

    fn update(&mut self, f: impl FnOnce(&mut SimRegisters)) -> Result<(), SimulatorError> {
        self.ether.with_node(self.index, |node| {
            // 模块断开时SPI写入无效
            if node.connected {
                f(&mut node.registers);
            }
        })
    }
}

impl RadioDevice for SimRadio {
    type Error = SimulatorError;

    const MAX_PAYLOAD_SIZE: usize = SIM_MAX_PAYLOAD;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.ether.with_node(self.index, |node| {
            if !node.connected || !node.responding {
                return Err(SimulatorError::NotResponding);
            }
            node.registers = SimRegisters::library_defaults();
            node.rx_fifo.clear();
            Ok(())
        })?
    }

    fn set_crc_length(&mut self, length: CrcLength) -> Result<(), Self::Error> {
        self.update(|r| r.crc_length = length)
    }

    fn stop_listening(&mut self) -> Result<(), Self::Error> {
        self.update(|r| {
            r.listening = false;
            r.enabled_pipes |= 1;
        })
    }

    fn set_retries(&mut self, delay: u8, count: u8) -> Result<(), Self::Error> {
        self.update(|r| {
            r.retry_delay = delay.min(15);
            r.retry_count = count.min(15);
        })
    }

    fn set_auto_ack(&mut self, enable: bool) -> Result<(), Self::Error> {
        self.update(|r| r.auto_ack = enable)
    }

    fn set_address_width(&mut self, width: u8) -> Result<(), Self::Error> {
        self.update(|r| r.address_width = width.clamp(3, ADDRESS_WIDTH as u8))
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.update(|r| r.channel = channel.min(MAX_CHANNEL))
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Self::Error> {
        self.update(|r| r.data_rate = rate)
    }

    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), Self::Error> {
        self.update(|r| r.pa_level = level)
    }

    fn power_up(&mut self) -> Result<(), Self::Error> {
        self.update(|r| r.powered = true)
    }

    fn power_down(&mut self) -> Result<(), Self::Error> {
        self.update(|r| r.powered = false)
    }

    fn set_payload_size(&mut self, size: usize) -> Result<(), Self::Error> {
        self.update(|r| r.payload_size = size.clamp(1, SIM_MAX_PAYLOAD))
    }

    fn payload_size(&self) -> usize {
        self.ether
            .with_node(self.index, |node| node.registers.payload_size)
            .unwrap_or(DEFAULT_PAYLOAD_SIZE)
    }

    fn open_writing_pipe(&mut self, address: &RadioAddress) -> Result<(), Self::Error> {
        let address = *address;
        self.update(|r| {
            r.tx_address = address;
            r.rx_pipes[0] = Some(address);
        })
    }

    fn open_reading_pipe(&mut self, pipe: u8, address: &RadioAddress) -> Result<(), Self::Error> {
        if pipe as usize >= 6 {
            return Err(SimulatorError::InvalidPipe(pipe));
        }

        let address = *address;
        self.update(|r| {
            r.rx_pipes[pipe as usize] = Some(address);
            r.enabled_pipes |= 1 << pipe;
        })
    }

    fn start_listening(&mut self) -> Result<(), Self::Error> {
        self.update(|r| {
            r.powered = true;
            r.listening = true;
            r.enabled_pipes &= !1;
        })
    }

    fn write(&mut self, payload: &[u8]) -> Result<bool, Self::Error> {
        self.ether.transmit(self.index, payload)
    }

    fn available(&mut self) -> Result<bool, Self::Error> {
        self.ether
            .with_node(self.index, |node| node.connected && !node.rx_fifo.is_empty())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        self.ether.with_node(self.index, |node| {
            if !node.connected {
                return 0;
            }
            match node.rx_fifo.pop_front() {
                Some(payload) => {
                    let copied = buffer.len().min(payload.len());
                    buffer[..copied].copy_from_slice(&payload[..copied]);
                    copied
                }
                None => 0,
            }
        })
    }

    fn is_chip_connected(&mut self) -> Result<bool, Self::Error> {
        self.ether.with_node(self.index, |node| node.connected)
    }
}

/// 测试用句柄：读取模块状态、模拟断线
#[derive(Clone)]
pub struct SimProbe {
    ether: SimEther,
    index: usize,
}

impl SimProbe {
    pub fn registers(&self) -> Option<SimRegisters> {
        self.ether.with_node(self.index, |node| node.registers.clone()).ok()
    }

    pub fn stats(&self) -> SimStats {
        self.ether
            .with_node(self.index, |node| node.stats.clone())
            .unwrap_or_default()
    }

    pub fn is_powered(&self) -> bool {
        self.registers().map_or(false, |r| r.powered)
    }

    /// 接收FIFO中尚未读取的帧
    pub fn pending_frames(&self) -> usize {
        self.ether
            .with_node(self.index, |node| node.rx_fifo.len())
            .unwrap_or(0)
    }

    /// 模拟模块掉线或重新接上
    pub fn set_connected(&self, connected: bool) {
        let _ = self.ether.with_node(self.index, |node| node.connected = connected);
    }

    /// 模拟初始化自检失败：`begin` 报错，其他寄存器操作照常生效
    pub fn set_responding(&self, responding: bool) {
        let _ = self.ether.with_node(self.index, |node| node.responding = responding);
    }
}

/// 外部唤醒事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeEvent {
    /// 门铃按键
    ButtonPressed,
}

/// 唤醒源，模拟接在中断引脚上的门铃按键
#[derive(Clone)]
pub struct WakeHandle {
    sender: Sender<WakeEvent>,
}

impl WakeHandle {
    /// 按下门铃，返回事件是否送达
    pub fn press(&self) -> bool {
        self.sender.send(WakeEvent::ButtonPressed).is_ok()
    }
}

/// 已执行的低功耗操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerOp {
    SetSleepMode(SleepMode),
    DisableInterrupts,
    EnableInterrupts,
    SleepEnable,
    SleepDisable,
    SleepCpu,
}

/// 模拟MCU电源管理
pub struct SimPower {
    wake: Receiver<WakeEvent>,
    ops: Vec<PowerOp>,
    mode: SleepMode,
    interrupts_enabled: bool,
    sleep_enabled: bool,
    wakeups: usize,
}

impl SimPower {
    pub fn new() -> (Self, WakeHandle) {
        let (sender, wake) = unbounded();
        let power = Self {
            wake,
            ops: Vec::new(),
            mode: SleepMode::Idle,
            interrupts_enabled: true,
            sleep_enabled: false,
            wakeups: 0,
        };
        (power, WakeHandle { sender })
    }

    pub fn ops(&self) -> &[PowerOp] {
        &self.ops
    }

    pub fn mode(&self) -> SleepMode {
        self.mode
    }

    pub fn is_sleep_enabled(&self) -> bool {
        self.sleep_enabled
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    pub fn wakeups(&self) -> usize {
        self.wakeups
    }
}

impl PowerControl for SimPower {
    type Error = SimulatorError;

    fn set_sleep_mode(&mut self, mode: SleepMode) {
        self.ops.push(PowerOp::SetSleepMode(mode));
        self.mode = mode;
    }

    fn disable_interrupts(&mut self) {
        self.ops.push(PowerOp::DisableInterrupts);
        self.interrupts_enabled = false;
    }

    fn enable_interrupts(&mut self) {
        self.ops.push(PowerOp::EnableInterrupts);
        self.interrupts_enabled = true;
    }

    fn sleep_enable(&mut self) {
        self.ops.push(PowerOp::SleepEnable);
        self.sleep_enabled = true;
    }

    fn sleep_disable(&mut self) {
        self.ops.push(PowerOp::SleepDisable);
        self.sleep_enabled = false;
    }

    fn sleep_cpu(&mut self) -> Result<(), Self::Error> {
        self.ops.push(PowerOp::SleepCpu);

        // 未允许休眠时休眠指令无效
        if !self.sleep_enabled {
            return Ok(());
        }
        if !self.interrupts_enabled {
            return Err(SimulatorError::SleepWithoutInterrupts);
        }

        self.wake.recv().map_err(|_| SimulatorError::WakeSourceClosed)?;
        self.wakeups += 1;
        Ok(())
    }
}
