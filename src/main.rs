//! 在同一进程内模拟门铃的两个节点：按钮节点和主机节点共用一条模拟信道。
//!
//! 日志级别通过 `RUST_LOG` 调整，例如 `RUST_LOG=debug`。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::hal::simulator::{SimEther, SimPower};
use common::link::LinkRadio;
use sink::{listen_for_alerts, Receiver};
use source::{run_source, PowerCycleManager};

/// 模拟按门铃的次数
const BUTTON_PRESSES: usize = 3;
const PRESS_INTERVAL: Duration = Duration::from_millis(500);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Starting CoBell link simulator");

    let ether = SimEther::new();
    let running = Arc::new(AtomicBool::new(true));

    // 主机先开始监听，按钮节点上电后立即发送第一条消息
    let mut sink_link = LinkRadio::new(ether.attach());
    if let Err(e) = listen_for_alerts(&mut sink_link) {
        log::error!("Sink node is not listening: {}", e);
    }

    let sink_running = running.clone();
    let sink = thread::spawn(move || {
        let mut receiver = Receiver::new(&mut sink_link);
        receiver.run_while(|| {
            thread::yield_now();
            sink_running.load(Ordering::Relaxed)
        });
        receiver.received()
    });

    let (power, wake) = SimPower::new();
    let mut source_link = LinkRadio::new(ether.attach());
    let source = thread::spawn(move || {
        let mut power = PowerCycleManager::new(power);
        match run_source(&mut source_link, &mut power) {
            Ok(never) => match never {},
            Err(e) => log::info!("Source node stopped: {}", e),
        }
        power.cycles()
    });

    for press in 1..=BUTTON_PRESSES {
        thread::sleep(PRESS_INTERVAL);
        log::info!("Doorbell button pressed ({}/{})", press, BUTTON_PRESSES);
        if !wake.press() {
            log::warn!("Source node is gone, stop pressing");
            break;
        }
    }
    // 拔掉唤醒源，按钮节点在下次休眠时退出
    drop(wake);

    let cycles = source.join().unwrap_or_else(|_| {
        log::error!("Source node thread panicked");
        0
    });

    thread::sleep(PRESS_INTERVAL);
    running.store(false, Ordering::Relaxed);
    let received = sink.join().unwrap_or_else(|_| {
        log::error!("Sink node thread panicked");
        0
    });

    log::info!(
        "{} alerts sent, {} received, {} frames on air",
        cycles + 1,
        received,
        ether.frames_on_air()
    );
}
