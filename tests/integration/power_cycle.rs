#[cfg(test)]
mod power_cycle_tests {
    use common::hal::simulator::{PowerOp, SimEther, SimPower, SimulatorError};
    use common::hal::SleepMode;
    use common::link::{LinkRadio, ALERT_MESSAGE};
    use sink::{listen_for_alerts, PollOutcome, Receiver};
    use source::{run_source, PowerCycleManager, PowerState};

    #[test]
    fn test_one_alert_per_wake() {
        let ether = SimEther::new();
        let source_radio = ether.attach();
        let source_probe = source_radio.probe();
        let mut source = LinkRadio::new(source_radio);
        let mut sink = LinkRadio::new(ether.attach());
        listen_for_alerts(&mut sink).unwrap();

        // 上电发送一次，之后每次按键再发送一次；接收FIFO深度为3
        let (power, wake) = SimPower::new();
        assert!(wake.press());
        assert!(wake.press());
        drop(wake);

        let mut manager = PowerCycleManager::new(power);
        let result = run_source(&mut source, &mut manager);
        assert!(matches!(result, Err(SimulatorError::WakeSourceClosed)));

        assert_eq!(manager.power().wakeups(), 2);
        assert_eq!(manager.cycles(), 2);
        assert_eq!(manager.state(), PowerState::Active);
        assert!(!source_probe.is_powered());

        let mut receiver = Receiver::new(&mut sink);
        for _ in 0..3 {
            match receiver.poll_once() {
                PollOutcome::Received(frame) => assert_eq!(frame.payload(), ALERT_MESSAGE),
                other => panic!("expected a frame, got {:?}", other),
            }
        }
        assert_eq!(receiver.poll_once(), PollOutcome::Idle);
    }

    #[test]
    fn test_sleep_sequence() {
        let ether = SimEther::new();
        let mut source = LinkRadio::new(ether.attach());
        let (power, wake) = SimPower::new();
        drop(wake);

        let mut manager = PowerCycleManager::new(power);
        assert!(run_source(&mut source, &mut manager).is_err());

        assert_eq!(
            manager.power().ops(),
            &[
                PowerOp::SetSleepMode(SleepMode::PowerDown),
                PowerOp::DisableInterrupts,
                PowerOp::SleepEnable,
                PowerOp::EnableInterrupts,
                PowerOp::SleepCpu,
                PowerOp::SleepDisable,
            ]
        );
        assert!(!manager.power().is_sleep_enabled());
    }

    #[test]
    fn test_wake_from_another_thread() {
        let ether = SimEther::new();
        let mut sink = LinkRadio::new(ether.attach());
        listen_for_alerts(&mut sink).unwrap();

        let (power, wake) = SimPower::new();
        let source_radio = ether.attach();
        let handle = std::thread::spawn(move || {
            let mut source = LinkRadio::new(source_radio);
            let mut manager = PowerCycleManager::new(power);
            let _ = run_source(&mut source, &mut manager);
            manager.cycles()
        });

        let mut receiver = Receiver::new(&mut sink);
        let mut received = 0;
        // 每收到一条再按一次，避免接收FIFO溢出
        while received < 3 {
            if let PollOutcome::Received(_) = receiver.poll_once() {
                received += 1;
                if received < 3 {
                    assert!(wake.press());
                }
            }
        }
        drop(wake);

        assert_eq!(handle.join().unwrap(), 2);
    }
}
