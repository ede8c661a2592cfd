#[cfg(test)]
mod link_config_tests {
    use common::hal::simulator::{SimEther, SimulatorError};
    use common::link::{
        CrcLength, DataRate, DeviceRole, LinkError, LinkRadio, PaLevel, RadioAddress, RadioLinkConfig,
    };

    #[test]
    fn test_shared_constants() {
        let config = RadioLinkConfig::COBELL;

        assert_eq!(config.crc_length, CrcLength::Crc16);
        assert_eq!(config.address_width, 5);
        assert_eq!(config.channel, 0);
        assert_eq!(config.data_rate, DataRate::Mbps1);
        assert_eq!(config.pa_level, PaLevel::Max);
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.retry_delay_us(), 1500);
        assert!(config.auto_ack);

        assert_eq!(RadioAddress::SOURCE.as_bytes(), b"CBSRC");
        assert_eq!(RadioAddress::SINK.as_bytes(), b"CBSNK");
        assert_eq!(RadioAddress::SINK.0.len(), config.address_width as usize);
    }

    #[test]
    fn test_source_configuration() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        let mut link = LinkRadio::new(radio);

        link.configure(DeviceRole::Source).unwrap();
        assert_eq!(link.role(), Some(DeviceRole::Source));

        let registers = probe.registers().unwrap();
        assert_eq!(registers.crc_length, CrcLength::Crc16);
        assert_eq!(registers.address_width, 5);
        assert_eq!(registers.channel, 0);
        assert_eq!(registers.data_rate, DataRate::Mbps1);
        assert_eq!(registers.pa_level, PaLevel::Max);
        assert_eq!(registers.retry_delay, 5);
        assert_eq!(registers.retry_count, 3);
        assert!(registers.auto_ack);
        assert!(registers.powered);
        assert!(!registers.listening);
    }

    #[test]
    fn test_sink_configuration() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        let mut link = LinkRadio::new(radio);

        link.configure(DeviceRole::Sink).unwrap();

        let registers = probe.registers().unwrap();
        assert!(registers.powered);
        assert!(registers.listening);
        assert_eq!(registers.rx_pipes[1], Some(RadioAddress::SINK));
        assert_eq!(registers.enabled_pipes, 0b10);
    }

    #[test]
    fn test_configuration_is_idempotent() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        let mut link = LinkRadio::new(radio);

        link.configure(DeviceRole::Sink).unwrap();
        let first = probe.registers().unwrap();
        link.configure(DeviceRole::Sink).unwrap();

        assert_eq!(probe.registers().unwrap(), first);
    }

    #[test]
    fn test_init_failure_leaves_radio_unconfigured() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        probe.set_connected(false);
        let mut link = LinkRadio::new(radio);

        let result = link.configure(DeviceRole::Sink);
        assert_eq!(result, Err(LinkError::RadioInit(SimulatorError::NotResponding)));
        assert!(!link.is_configured());
        assert!(!probe.is_powered());
        assert!(!probe.registers().unwrap().listening);
    }

    #[test]
    fn test_reconfigure_after_unplug_clears_role() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        let mut link = LinkRadio::new(radio);

        link.configure(DeviceRole::Sink).unwrap();
        probe.set_connected(false);

        assert!(link.configure(DeviceRole::Sink).is_err());
        assert_eq!(link.role(), None);
    }

    #[test]
    fn test_failed_init_powers_down_running_radio() {
        let ether = SimEther::new();
        let radio = ether.attach();
        let probe = radio.probe();
        let mut link = LinkRadio::new(radio);

        link.configure(DeviceRole::Sink).unwrap();
        assert!(probe.is_powered());

        // 自检失败但寄存器仍可写，关机必须真正落到模块上
        probe.set_responding(false);
        let result = link.configure(DeviceRole::Sink);
        assert_eq!(result, Err(LinkError::RadioInit(SimulatorError::NotResponding)));
        assert!(!probe.is_powered());
        assert!(!link.is_configured());
    }
}
