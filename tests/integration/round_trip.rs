#[cfg(test)]
mod round_trip_tests {
    use common::hal::simulator::{SimEther, SimProbe, SimRadio};
    use common::link::{DeviceRole, LinkRadio, ALERT_MESSAGE, ALERT_PAYLOAD_SIZE};
    use sink::{listen_for_alerts, PollOutcome, Receiver, RX_BUFFER_SIZE};
    use source::{alert_cycle, TransmitReport};

    struct Pair {
        ether: SimEther,
        source: LinkRadio<SimRadio>,
        source_probe: SimProbe,
        sink: LinkRadio<SimRadio>,
        sink_probe: SimProbe,
    }

    fn setup_pair() -> Pair {
        let ether = SimEther::new();
        let source_radio = ether.attach();
        let sink_radio = ether.attach();
        let source_probe = source_radio.probe();
        let sink_probe = sink_radio.probe();

        let mut sink = LinkRadio::new(sink_radio);
        listen_for_alerts(&mut sink).unwrap();

        Pair {
            ether,
            source: LinkRadio::new(source_radio),
            source_probe,
            sink,
            sink_probe,
        }
    }

    #[test]
    fn test_alert_round_trip() {
        let mut pair = setup_pair();

        assert_eq!(alert_cycle(&mut pair.source), TransmitReport::Acknowledged);
        assert_eq!(pair.ether.frames_on_air(), 1);

        let mut receiver = Receiver::new(&mut pair.sink);
        let frame = match receiver.poll_once() {
            PollOutcome::Received(frame) => frame,
            other => panic!("expected a frame, got {:?}", other),
        };

        // 恰好34字节，逐字节一致，缓冲区其余部分为零
        assert_eq!(frame.len(), ALERT_PAYLOAD_SIZE);
        assert_eq!(frame.payload(), ALERT_MESSAGE);
        assert!(frame.buffer()[ALERT_PAYLOAD_SIZE..RX_BUFFER_SIZE].iter().all(|&b| b == 0));

        let alert = frame.alert().unwrap();
        assert!(alert.is_alert());
        assert!(alert.is_from_source());
    }

    #[test]
    fn test_source_radio_powered_down_after_cycle() {
        let mut pair = setup_pair();

        alert_cycle(&mut pair.source);

        let registers = pair.source_probe.registers().unwrap();
        assert!(!registers.powered);
        assert_eq!(registers.payload_size, ALERT_PAYLOAD_SIZE);
        assert_eq!(registers.tx_address, DeviceRole::Source.peer_address());
    }

    #[test]
    fn test_repeated_cycles() {
        let mut pair = setup_pair();
        let mut receiver = Receiver::new(&mut pair.sink);

        for _ in 0..5 {
            assert_eq!(alert_cycle(&mut pair.source), TransmitReport::Acknowledged);
            assert!(matches!(receiver.poll_once(), PollOutcome::Received(_)));
        }

        assert_eq!(receiver.received(), 5);
        assert_eq!(receiver.poll_once(), PollOutcome::Idle);
    }

    #[test]
    fn test_poll_without_data_returns_immediately() {
        let mut pair = setup_pair();
        let mut receiver = Receiver::new(&mut pair.sink);

        for _ in 0..10 {
            assert_eq!(receiver.poll_once(), PollOutcome::Idle);
        }
        assert_eq!(receiver.received(), 0);
    }

    #[test]
    fn test_offline_sink_does_not_read() {
        let mut pair = setup_pair();
        alert_cycle(&mut pair.source);
        assert_eq!(pair.sink_probe.pending_frames(), 1);

        pair.sink_probe.set_connected(false);
        let mut receiver = Receiver::new(&mut pair.sink);
        assert_eq!(receiver.poll_once(), PollOutcome::Offline);

        // 重新接上之后帧仍然在FIFO里
        pair.sink_probe.set_connected(true);
        assert_eq!(pair.sink_probe.pending_frames(), 1);
        assert!(matches!(receiver.poll_once(), PollOutcome::Received(_)));
    }

    #[test]
    fn test_source_init_failure_sends_nothing() {
        let mut pair = setup_pair();
        pair.source_probe.set_connected(false);

        assert_eq!(alert_cycle(&mut pair.source), TransmitReport::Aborted);
        assert_eq!(pair.ether.frames_on_air(), 0);
        assert!(!pair.source_probe.is_powered());
        assert_eq!(pair.sink_probe.pending_frames(), 0);
    }

    #[test]
    fn test_source_init_failure_powers_down() {
        let mut pair = setup_pair();
        pair.source.configure(DeviceRole::Source).unwrap();
        assert!(pair.source_probe.is_powered());

        pair.source_probe.set_responding(false);
        assert_eq!(alert_cycle(&mut pair.source), TransmitReport::Aborted);
        assert!(!pair.source_probe.is_powered());
        assert_eq!(pair.ether.frames_on_air(), 0);
    }

    #[test]
    fn test_source_without_sink_is_dropped() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        let mut source = LinkRadio::new(radio);

        assert_eq!(alert_cycle(&mut source), TransmitReport::Dropped);
        // 1次发送 + 3次硬件重传
        assert_eq!(probe.stats().transmissions, 4);
        assert!(!probe.is_powered());
    }
}
