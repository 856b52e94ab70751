//! Mock 硬件
//!
//! 纯内存实现的设备、虚拟时钟和仿真底盘，用于测试和命令行仿真，无需任何真实硬件。
//!
//! 所有 mock 设备都是 `Clone` 的句柄：克隆体共享同一份状态，
//! 测试代码保留一份句柄用于注入读数和检查命令，另一份交给控制器。

mod chassis;
mod clock;
mod devices;
mod rig;

pub use chassis::{MotionCommandKind, MotionRecord, SimChassis, SimChassisConfig};
pub use clock::ManualClock;
pub use devices::{
    DeviceEvent, EventKind, MockDigitalIn, MockDigitalOut, MockDistance, MockGamepad, MockMotor,
    MockRotation, Recorder,
};
pub use rig::{LoaderPlantConfig, MockRig};
