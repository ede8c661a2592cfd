#[cfg(test)]
mod alert_message_tests {
    use common::link::{
        AlertMessage, ALERT_COMMAND, ALERT_MESSAGE, ALERT_PAYLOAD_SIZE, SOURCE_IDENTIFIER,
    };

    #[test]
    fn test_payload_size_binding() {
        // 修改消息内容时必须同步修改负载大小
        assert_eq!(ALERT_MESSAGE.len(), ALERT_PAYLOAD_SIZE);
        assert_eq!(ALERT_PAYLOAD_SIZE, 34);
    }

    #[test]
    fn test_message_format() {
        assert_eq!(&ALERT_MESSAGE[..33], b"com.cobox.iot.cobell.source,alert");
        assert_eq!(ALERT_MESSAGE[33], 0);

        let message = AlertMessage::parse(ALERT_MESSAGE).unwrap();
        assert_eq!(message.sender, SOURCE_IDENTIFIER);
        assert_eq!(message.command, ALERT_COMMAND);
    }

    #[test]
    fn test_parse_padded_buffer() {
        let mut buffer = [0u8; 64];
        buffer[..ALERT_MESSAGE.len()].copy_from_slice(ALERT_MESSAGE);

        let message = AlertMessage::parse(&buffer).unwrap();
        assert!(message.is_alert());
        assert!(message.is_from_source());
    }

    #[test]
    fn test_parse_other_command() {
        let message = AlertMessage::parse(b"com.cobox.iot.cobell.sink,mute").unwrap();
        assert!(!message.is_alert());
        assert!(!message.is_from_source());
    }
}
