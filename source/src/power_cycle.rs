use common::hal::{PowerControl, SleepMode};

/// 发送端的电源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// 配置无线模块、发送中
    Active,
    /// 掉电休眠，等待外部中断唤醒
    Sleeping,
}

/// 掉电休眠管理。
///
/// 系统没有配置定时唤醒，只能由外部中断（门铃按键）唤醒。
pub struct PowerCycleManager<P: PowerControl> {
    power: P,
    state: PowerState,
    cycles: u32,
    observer: Option<fn(PowerState)>,
}

impl<P: PowerControl> PowerCycleManager<P> {
    pub fn new(power: P) -> Self {
        Self {
            power,
            state: PowerState::Active,
            cycles: 0,
            observer: None,
        }
    }

    /// 每次状态切换时调用 `observer`，休眠期间它看到的是 `Sleeping`
    pub fn with_observer(power: P, observer: fn(PowerState)) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new(power)
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// 已完成的休眠次数
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub fn power_mut(&mut self) -> &mut P {
        &mut self.power
    }

    /// 进入掉电模式，被唤醒后返回
    pub fn sleep(&mut self) -> Result<(), P::Error> {
        self.power.set_sleep_mode(SleepMode::PowerDown);
        self.power.disable_interrupts();
        self.power.sleep_enable();
        self.power.enable_interrupts();
        self.transition(PowerState::Sleeping);

        let woke = self.power.sleep_cpu();

        // 唤醒后及时禁用休眠，防止其他中断再次进入休眠
        self.power.sleep_disable();
        self.transition(PowerState::Active);

        woke?;
        self.cycles = self.cycles.wrapping_add(1);
        Ok(())
    }

    fn transition(&mut self, next: PowerState) {
        log::debug!("Power state {:?} -> {:?}", self.state, next);
        self.state = next;
        if let Some(observer) = self.observer {
            observer(next);
        }
    }
}
