use crate::hal::RadioDevice;
use crate::link::{DeviceRole, LinkError, RadioLinkConfig};

/// 接收端使用的数据管道
pub const SINK_READING_PIPE: u8 = 1;

/// 无线模块句柄，每个进程只创建一次
pub struct LinkRadio<R: RadioDevice> {
    radio: R,
    config: RadioLinkConfig,
    role: Option<DeviceRole>,
}

impl<R: RadioDevice> LinkRadio<R> {
    pub fn new(radio: R) -> Self {
        Self::with_config(radio, RadioLinkConfig::COBELL)
    }

    pub fn with_config(radio: R, config: RadioLinkConfig) -> Self {
        Self {
            radio,
            config,
            role: None,
        }
    }

    pub fn config(&self) -> &RadioLinkConfig {
        &self.config
    }

    /// 最近一次成功配置的角色
    pub fn role(&self) -> Option<DeviceRole> {
        self.role
    }

    pub fn is_configured(&self) -> bool {
        self.role.is_some()
    }

    pub fn get_radio(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn into_inner(self) -> R {
        self.radio
    }

    /// 按固定顺序配置无线模块。接收端随后打开1号读管道并开始监听。
    ///
    /// 任何一步失败都会关闭模块电源并返回错误，模块保持未配置状态。
    pub fn configure(&mut self, role: DeviceRole) -> Result<(), LinkError<R::Error>> {
        self.role = None;

        if let Err(e) = self.radio.begin() {
            log::error!("Radio device connect failed, shutdown!");
            self.shutdown();
            return Err(LinkError::RadioInit(e));
        }
        log::info!("Radio device online");

        if let Err(e) = self.apply_shared().and_then(|_| self.open_role_pipe(role)) {
            log::error!("Radio device configuration failed: {:?}", e);
            self.shutdown();
            return Err(LinkError::Device(e));
        }

        self.role = Some(role);
        Ok(())
    }

    pub fn power_up(&mut self) -> Result<(), R::Error> {
        self.radio.power_up()
    }

    pub fn power_down(&mut self) -> Result<(), R::Error> {
        self.radio.power_down()
    }

    fn apply_shared(&mut self) -> Result<(), R::Error> {
        let config = self.config;

        self.radio.set_crc_length(config.crc_length)?;
        self.radio.stop_listening()?;
        self.radio.set_retries(config.retry_delay, config.retry_count)?;
        self.radio.set_auto_ack(config.auto_ack)?;
        self.radio.set_address_width(config.address_width)?;
        self.radio.set_channel(config.channel)?;
        self.radio.set_data_rate(config.data_rate)?;
        self.radio.set_pa_level(config.pa_level)?;
        self.radio.power_up()?;
        log::info!("Radio device power up");

        Ok(())
    }

    fn open_role_pipe(&mut self, role: DeviceRole) -> Result<(), R::Error> {
        match role {
            // 写管道会同时写入负载宽度，由发送方在设置负载大小之后打开
            DeviceRole::Source => {}
            DeviceRole::Sink => {
                self.radio.open_reading_pipe(SINK_READING_PIPE, &role.own_address())?;
                log::info!("Radio device open reading pipeline at {}", role.own_address());

                self.radio.start_listening()?;
                log::info!("Radio device start listening");
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.radio.power_down() {
            log::warn!("Radio device power down failed: {:?}", e);
        }
    }
}
