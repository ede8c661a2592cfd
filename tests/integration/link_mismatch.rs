#[cfg(test)]
mod link_mismatch_tests {
    use common::hal::simulator::SimEther;
    use common::link::{CrcLength, DataRate, LinkRadio, RadioLinkConfig};
    use sink::{listen_for_alerts, PollOutcome, Receiver};
    use source::{alert_cycle, TransmitReport};

    const ATTEMPTS: usize = 20;

    /// 发送端使用给定配置，接收端使用标准配置，返回接收端收到的帧数
    fn frames_delivered(source_config: RadioLinkConfig) -> usize {
        let ether = SimEther::new();
        let mut source = LinkRadio::with_config(ether.attach(), source_config);
        let mut sink = LinkRadio::new(ether.attach());
        listen_for_alerts(&mut sink).unwrap();

        let mut receiver = Receiver::new(&mut sink);
        let mut delivered = 0;
        for _ in 0..ATTEMPTS {
            assert_eq!(alert_cycle(&mut source), TransmitReport::Dropped);
            if let PollOutcome::Received(_) = receiver.poll_once() {
                delivered += 1;
            }
        }
        delivered
    }

    #[test]
    fn test_channel_mismatch() {
        let config = RadioLinkConfig {
            channel: 76,
            ..RadioLinkConfig::COBELL
        };
        assert!(!config.is_compatible_with(&RadioLinkConfig::COBELL));
        assert_eq!(frames_delivered(config), 0);
    }

    #[test]
    fn test_crc_length_mismatch() {
        let config = RadioLinkConfig {
            crc_length: CrcLength::Crc8,
            ..RadioLinkConfig::COBELL
        };
        assert_eq!(frames_delivered(config), 0);
    }

    #[test]
    fn test_data_rate_mismatch() {
        let config = RadioLinkConfig {
            data_rate: DataRate::Mbps2,
            ..RadioLinkConfig::COBELL
        };
        assert_eq!(frames_delivered(config), 0);
    }

    #[test]
    fn test_address_width_mismatch() {
        let config = RadioLinkConfig {
            address_width: 4,
            ..RadioLinkConfig::COBELL
        };
        assert_eq!(frames_delivered(config), 0);
    }

    #[test]
    fn test_pa_level_does_not_matter() {
        let ether = SimEther::new();
        let config = RadioLinkConfig {
            pa_level: common::link::PaLevel::Min,
            ..RadioLinkConfig::COBELL
        };
        assert!(config.is_compatible_with(&RadioLinkConfig::COBELL));

        let mut source = LinkRadio::with_config(ether.attach(), config);
        let mut sink = LinkRadio::new(ether.attach());
        listen_for_alerts(&mut sink).unwrap();

        assert_eq!(alert_cycle(&mut source), TransmitReport::Acknowledged);
    }
}
