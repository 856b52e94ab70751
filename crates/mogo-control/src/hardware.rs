//! 子系统设备集合
//!
//! 控制器只通过 [`mogo_hal`] 的 trait 访问设备，这里把它们装箱成一个整体，
//! 以便在真实硬件和 mock 设备之间切换。

use mogo_hal::{DigitalIn, DigitalOut, DistanceSensor, Motor, RotationSensor};

/// 子系统使用的全部设备
pub struct Hardware {
    pub intake: Box<dyn Motor + Send>,
    pub arm: Box<dyn Motor + Send>,
    pub arm_rotation: Box<dyn RotationSensor + Send>,
    /// 两个取环位距离传感器
    pub loader: [Box<dyn DistanceSensor + Send>; 2],
    /// 主夹爪气缸
    pub clamp_primary: Box<dyn DigitalOut + Send>,
    /// 两个预压气缸
    pub clamp_prestage: [Box<dyn DigitalOut + Send>; 2],
    /// 手臂底部限位开关
    pub interlock: Box<dyn DigitalIn + Send>,
}

impl std::fmt::Debug for Hardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hardware").finish_non_exhaustive()
    }
}

#[cfg(any(test, feature = "mock"))]
impl Hardware {
    /// 从 mock 设备组构建（设备句柄共享状态，测试仍可通过 `rig` 观察和注入）
    pub fn from_mock(rig: &mogo_hal::mock::MockRig) -> Self {
        let [loader_a, loader_b] = rig.loader.clone();
        let [prestage_a, prestage_b] = rig.clamp_prestage.clone();

        Self {
            intake: Box::new(rig.intake.clone()),
            arm: Box::new(rig.arm.clone()),
            arm_rotation: Box::new(rig.arm_rotation.clone()),
            loader: [Box::new(loader_a), Box::new(loader_b)],
            clamp_primary: Box::new(rig.clamp_primary.clone()),
            clamp_prestage: [Box::new(prestage_a), Box::new(prestage_b)],
            interlock: Box::new(rig.interlock.clone()),
        }
    }
}
