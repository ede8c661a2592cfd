use crc::{Algorithm, Crc, CRC_16_IBM_3740};

use crate::link::CrcLength;

/// nRF24L01 的1字节CRC：多项式 0x07，初始值 0xFF
const NRF24_CRC_8: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x07,
    init: 0xff,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xfb,
    residue: 0x00,
};

const CRC8: Crc<u8> = Crc::<u8>::new(&NRF24_CRC_8);

/// 2字节CRC：CRC-16-CCITT，多项式 0x1021，初始值 0xFFFF
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// 计算空中帧的CRC（覆盖地址和负载）
pub fn frame_crc(length: CrcLength, data: &[u8]) -> u16 {
    match length {
        CrcLength::Disabled => 0,
        CrcLength::Crc8 => CRC8.checksum(data) as u16,
        CrcLength::Crc16 => CRC16.checksum(data),
    }
}

/// 校验帧尾CRC，`trailer` 为大端字节
pub fn verify_frame_crc(length: CrcLength, data: &[u8], trailer: &[u8]) -> bool {
    if trailer.len() != length.width_bytes() {
        return false;
    }

    let expected = frame_crc(length, data);
    match length {
        CrcLength::Disabled => true,
        CrcLength::Crc8 => trailer[0] as u16 == expected,
        CrcLength::Crc16 => u16::from_be_bytes([trailer[0], trailer[1]]) == expected,
    }
}
