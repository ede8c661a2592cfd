use common::hal::RadioDevice;
use common::link::{DeviceRole, LinkRadio, ALERT_MESSAGE, ALERT_PAYLOAD_SIZE};

/// 单次发送结果，仅用于诊断输出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitReport {
    /// 接收端硬件回执
    Acknowledged,
    /// 重传次数用尽，消息被丢弃
    Dropped,
    /// 模块未就绪，没有发送
    Aborted,
}

/// 发送端，借用已配置好的无线模块
pub struct Transmitter<'a, R: RadioDevice> {
    link: &'a mut LinkRadio<R>,
}

impl<'a, R: RadioDevice> Transmitter<'a, R> {
    pub fn new(link: &'a mut LinkRadio<R>) -> Self {
        Self { link }
    }

    /// 发送一条门铃消息。
    ///
    /// 无论发送是否成功，返回前都会关闭无线模块。除了硬件的自动重传以外不做任何重试。
    pub fn send_alert(&mut self) -> TransmitReport {
        let report = if self.link.role() == Some(DeviceRole::Source) {
            self.transmit()
        } else {
            log::warn!("Radio device is not configured for sending, alert skipped");
            TransmitReport::Aborted
        };

        // 无线发射关机
        if let Err(e) = self.link.power_down() {
            log::warn!("Radio device power down failed: {:?}", e);
        }
        report
    }

    fn transmit(&mut self) -> TransmitReport {
        let peer = DeviceRole::Source.peer_address();
        let radio = self.link.get_radio();

        // 负载大小设置为消息长度，避免发送多余的填充字节
        let opened = radio
            .set_payload_size(ALERT_PAYLOAD_SIZE)
            .and_then(|_| radio.open_writing_pipe(&peer));
        if let Err(e) = opened {
            log::error!("Radio device open writing pipeline failed: {:?}", e);
            return TransmitReport::Aborted;
        }

        match radio.write(ALERT_MESSAGE) {
            Ok(true) => {
                log::info!("Alert delivered to {}", peer);
                TransmitReport::Acknowledged
            }
            Ok(false) => {
                log::debug!("Alert to {} not acknowledged", peer);
                TransmitReport::Dropped
            }
            Err(e) => {
                log::debug!("Alert to {} failed: {:?}", peer, e);
                TransmitReport::Dropped
            }
        }
    }
}
