//! Mock 整车设备组

use super::devices::{ArmPlant, LoaderPlant};
use super::{MockDigitalIn, MockDigitalOut, MockDistance, MockGamepad, MockMotor, MockRotation};
use super::{DeviceEvent, Recorder};
use crate::Clock;
use std::sync::Arc;
use std::time::Duration;

/// 取环模型参数
#[derive(Debug, Clone)]
pub struct LoaderPlantConfig {
    /// 正转多久后圆环到达取环位
    pub feed_time: Duration,
    /// 反转多久后圆环被清出
    pub clear_time: Duration,
    /// 有环时的距离读数
    pub present_mm: u32,
    /// 空位时的距离读数
    pub empty_mm: u32,
}

impl Default for LoaderPlantConfig {
    fn default() -> Self {
        Self {
            feed_time: Duration::from_millis(300),
            clear_time: Duration::from_millis(200),
            present_mm: 40,
            empty_mm: 120,
        }
    }
}

/// 整车 mock 设备
///
/// 设备命名与事件记录中的设备名一致：
/// `intake`, `arm`, `clamp`, `clamp_prestage_left`, `clamp_prestage_right`。
#[derive(Debug, Clone)]
pub struct MockRig {
    pub recorder: Recorder,
    pub intake: MockMotor,
    pub arm: MockMotor,
    pub arm_rotation: MockRotation,
    pub loader: [MockDistance; 2],
    pub clamp_primary: MockDigitalOut,
    pub clamp_prestage: [MockDigitalOut; 2],
    pub interlock: MockDigitalIn,
    pub gamepad: MockGamepad,
}

impl MockRig {
    /// 创建设备组
    ///
    /// 初始状态：手臂角度 0，两个取环位为空（120mm），限位开关未触发。
    pub fn new(clock: impl Clock + Send + Sync + 'static) -> Self {
        let recorder = Recorder::new(Arc::new(clock));

        Self {
            intake: MockMotor::new("intake", recorder.clone()),
            arm: MockMotor::new("arm", recorder.clone()),
            arm_rotation: MockRotation::new(0),
            loader: [MockDistance::new(120), MockDistance::new(120)],
            clamp_primary: MockDigitalOut::new("clamp", recorder.clone()),
            clamp_prestage: [
                MockDigitalOut::new("clamp_prestage_left", recorder.clone()),
                MockDigitalOut::new("clamp_prestage_right", recorder.clone()),
            ],
            interlock: MockDigitalIn::new(false),
            gamepad: MockGamepad::new(),
            recorder,
        }
    }

    /// 挂接手臂模型：旋转传感器角度按手臂电机速度积分
    ///
    /// `gain` 为每 RPM 每秒的角度增量（百分之一度）。
    pub fn with_arm_plant(self, gain: f64) -> Self {
        let clock = self.recorder.clock();
        {
            let mut state = self.arm_rotation.state.lock();
            state.plant = Some(ArmPlant {
                motor: self.arm.state.clone(),
                gain,
                last: clock.now(),
                clock,
            });
        }
        self
    }

    /// 挂接取环模型（作用于第一个距离传感器）
    pub fn with_loader_plant(self, config: LoaderPlantConfig) -> Self {
        let clock = self.recorder.clock();
        {
            let mut state = self.loader[0].state.lock();
            state.distance = config.empty_mm;
            state.plant = Some(LoaderPlant {
                intake: self.intake.state.clone(),
                last: clock.now(),
                clock,
                ring_present: false,
                accumulated: Duration::ZERO,
                feed_time: config.feed_time,
                clear_time: config.clear_time,
                present_mm: config.present_mm,
                empty_mm: config.empty_mm,
            });
        }
        self.loader[1].set(config.empty_mm);
        self
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.recorder.events()
    }
}
