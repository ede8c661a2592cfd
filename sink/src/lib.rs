#![cfg_attr(not(feature = "simulator"), no_std)]

//! 门铃主机节点：启动时配置一次无线模块，之后一直轮询接收门铃消息。

pub mod receiver;

use common::hal::RadioDevice;
use common::link::{DeviceRole, LinkError, LinkRadio};

pub use receiver::{PollOutcome, ReceivedFrame, Receiver, RX_BUFFER_SIZE};

/// 配置为接收端并开始监听。
///
/// 失败时模块保持未配置状态，之后的轮询会一直报告离线。
pub fn listen_for_alerts<R: RadioDevice>(link: &mut LinkRadio<R>) -> Result<(), LinkError<R::Error>> {
    link.configure(DeviceRole::Sink).map_err(|e| {
        log::error!("Sink setup failed: {}", e);
        e
    })
}

/// 目标板上的接收端入口，不会返回。主机模拟器需要退出，直接使用 `listen_for_alerts` 和 `Receiver::run_while`。
pub fn run_sink<R: RadioDevice>(link: &mut LinkRadio<R>) -> ! {
    let _ = listen_for_alerts(link);

    let mut receiver = Receiver::new(link);
    loop {
        receiver.poll_once();
    }
}
