//! 仿真整车
//!
//! mock 设备组挂接手臂和取环模型，底盘使用按时间推进的仿真运动控制器。

use mogo_control::{Hardware, Robot, RobotConfig};
use mogo_hal::Clock;
use mogo_hal::mock::{LoaderPlantConfig, MockRig, SimChassis};

/// 手臂模型增益：600 RPM 时每秒转过 60 度
const ARM_PLANT_GAIN: f64 = 10.0;

pub struct SimRobot<C: Clock> {
    pub rig: MockRig,
    pub robot: Robot,
    pub chassis: SimChassis<C>,
}

impl<C> SimRobot<C>
where
    C: Clock + Clone + Send + Sync + 'static,
{
    pub fn new(clock: C, config: RobotConfig) -> Self {
        let rig = MockRig::new(clock.clone())
            .with_arm_plant(ARM_PLANT_GAIN)
            .with_loader_plant(LoaderPlantConfig::default());
        let robot = Robot::new(Hardware::from_mock(&rig), config);

        Self {
            rig,
            robot,
            chassis: SimChassis::new(clock),
        }
    }
}
