#![cfg_attr(not(feature = "simulator"), no_std)]

//! 门铃按钮节点：每次被唤醒发送一条门铃消息，随后进入掉电休眠。

pub mod power_cycle;
pub mod transmitter;

use core::convert::Infallible;

use common::hal::{PowerControl, RadioDevice};
use common::link::{DeviceRole, LinkRadio};

pub use power_cycle::{PowerCycleManager, PowerState};
pub use transmitter::{TransmitReport, Transmitter};

/// 一个唤醒周期：配置无线模块并发送门铃消息。
///
/// 初始化失败时模块已被关闭，本周期直接放弃，不重试。
pub fn alert_cycle<R: RadioDevice>(link: &mut LinkRadio<R>) -> TransmitReport {
    if let Err(e) = link.configure(DeviceRole::Source) {
        log::error!("Alert aborted: {}", e);
        return TransmitReport::Aborted;
    }

    Transmitter::new(link).send_alert()
}

/// 发送端主循环：发送 -> 休眠 -> 等待唤醒 -> 发送 ...
///
/// 只有唤醒源失效时才会返回。
pub fn run_source<R, P>(
    link: &mut LinkRadio<R>,
    power: &mut PowerCycleManager<P>,
) -> Result<Infallible, P::Error>
where
    R: RadioDevice,
    P: PowerControl,
{
    loop {
        let report = alert_cycle(link);
        log::debug!("Alert cycle finished: {:?}", report);

        power.sleep()?;
    }
}
