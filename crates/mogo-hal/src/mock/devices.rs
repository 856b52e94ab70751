//! Mock 设备

use crate::{Axis, BrakeMode, Button, Clock, DigitalIn, DigitalOut, DistanceSensor, Gamepad, HalError};
use crate::{Motor, RotationSensor};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// 设备事件类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    Velocity(i32),
    Brake,
    BrakeMode(BrakeMode),
    Digital(bool),
}

/// 带时间戳的设备事件
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub at: Duration,
    pub device: &'static str,
    pub kind: EventKind,
}

/// 设备事件记录器
///
/// 所有执行器共享一个记录器，测试可以据此检查命令的先后顺序和时间间隔。
#[derive(Clone)]
pub struct Recorder {
    clock: Arc<dyn Clock + Send + Sync>,
    events: Arc<Mutex<Vec<DeviceEvent>>>,
}

impl Recorder {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            clock,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn record(&self, device: &'static str, kind: EventKind) {
        let at = self.clock.now();
        self.events.lock().push(DeviceEvent { at, device, kind });
    }

    /// 全部事件的快照
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().clone()
    }

    /// 指定设备的事件
    pub fn events_for(&self, device: &str) -> Vec<DeviceEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.device == device)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("events", &self.events.lock().len())
            .finish()
    }
}

// ==================== 电机 ====================

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MotorState {
    pub velocity: i32,
    pub braked: bool,
    pub brake_mode: BrakeMode,
}

impl MotorState {
    /// 实际输出速度（刹车时为 0）
    pub fn effective_velocity(&self) -> i32 {
        if self.braked { 0 } else { self.velocity }
    }
}

/// Mock 电机
#[derive(Debug, Clone)]
pub struct MockMotor {
    name: &'static str,
    pub(crate) state: Arc<Mutex<MotorState>>,
    recorder: Recorder,
}

impl MockMotor {
    pub fn new(name: &'static str, recorder: Recorder) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(MotorState::default())),
            recorder,
        }
    }

    /// 最近一次命令的速度
    pub fn velocity(&self) -> i32 {
        self.state.lock().velocity
    }

    /// 是否处于刹车状态
    pub fn is_braked(&self) -> bool {
        self.state.lock().braked
    }

    pub fn brake_mode(&self) -> BrakeMode {
        self.state.lock().brake_mode
    }
}

impl Motor for MockMotor {
    fn set_velocity(&mut self, rpm: i32) {
        {
            let mut state = self.state.lock();
            state.velocity = rpm;
            state.braked = false;
        }
        self.recorder.record(self.name, EventKind::Velocity(rpm));
    }

    fn brake(&mut self) {
        {
            let mut state = self.state.lock();
            state.velocity = 0;
            state.braked = true;
        }
        self.recorder.record(self.name, EventKind::Brake);
    }

    fn set_brake_mode(&mut self, mode: BrakeMode) {
        self.state.lock().brake_mode = mode;
        self.recorder.record(self.name, EventKind::BrakeMode(mode));
    }
}

// ==================== 数字 IO ====================

/// Mock 数字输出
#[derive(Debug, Clone)]
pub struct MockDigitalOut {
    name: &'static str,
    level: Arc<Mutex<bool>>,
    recorder: Recorder,
}

impl MockDigitalOut {
    pub fn new(name: &'static str, recorder: Recorder) -> Self {
        Self {
            name,
            level: Arc::new(Mutex::new(false)),
            recorder,
        }
    }

    pub fn level(&self) -> bool {
        *self.level.lock()
    }
}

impl DigitalOut for MockDigitalOut {
    fn set(&mut self, high: bool) {
        *self.level.lock() = high;
        self.recorder.record(self.name, EventKind::Digital(high));
    }
}

/// Mock 数字输入
#[derive(Debug, Clone)]
pub struct MockDigitalIn {
    value: Arc<Mutex<Result<bool, HalError>>>,
}

impl MockDigitalIn {
    pub fn new(initial: bool) -> Self {
        Self {
            value: Arc::new(Mutex::new(Ok(initial))),
        }
    }

    pub fn set(&self, high: bool) {
        *self.value.lock() = Ok(high);
    }

    /// 注入读取故障
    pub fn set_fault(&self, error: HalError) {
        *self.value.lock() = Err(error);
    }
}

impl DigitalIn for MockDigitalIn {
    fn read(&self) -> Result<bool, HalError> {
        self.value.lock().clone()
    }
}

// ==================== 传感器 ====================

/// 手臂物理模型：角度按手臂电机的实际输出速度积分
pub(crate) struct ArmPlant {
    pub motor: Arc<Mutex<MotorState>>,
    /// 每 RPM 每秒对应的角度增量（百分之一度）
    pub gain: f64,
    pub last: Duration,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

pub(crate) struct RotationState {
    pub angle: f64,
    pub fault: Option<HalError>,
    pub plant: Option<ArmPlant>,
}

/// Mock 旋转传感器
///
/// 默认返回测试注入的固定角度；挂接手臂模型后角度随电机速度变化。
#[derive(Clone)]
pub struct MockRotation {
    pub(crate) state: Arc<Mutex<RotationState>>,
}

impl MockRotation {
    pub fn new(initial: i32) -> Self {
        Self {
            state: Arc::new(Mutex::new(RotationState {
                angle: initial as f64,
                fault: None,
                plant: None,
            })),
        }
    }

    pub fn set(&self, angle: i32) {
        let mut state = self.state.lock();
        state.angle = angle as f64;
        state.fault = None;
    }

    pub fn set_fault(&self, error: HalError) {
        self.state.lock().fault = Some(error);
    }
}

impl RotationSensor for MockRotation {
    fn angle(&self) -> Result<i32, HalError> {
        let mut state = self.state.lock();
        if let Some(err) = &state.fault {
            return Err(err.clone());
        }

        let mut delta = 0.0;
        if let Some(plant) = state.plant.as_mut() {
            let now = plant.clock.now();
            let dt = now.saturating_sub(plant.last).as_secs_f64();
            let velocity = plant.motor.lock().effective_velocity();
            delta = velocity as f64 * plant.gain * dt;
            plant.last = now;
        }
        state.angle = (state.angle + delta).rem_euclid(36000.0);

        Ok(state.angle.round() as i32)
    }
}

impl std::fmt::Debug for MockRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockRotation")
            .field("angle", &state.angle)
            .field("fault", &state.fault)
            .field("plant", &state.plant.is_some())
            .finish()
    }
}

/// 取环模型：进料时间累计到阈值后出现圆环，反转累计到阈值后圆环被清出
pub(crate) struct LoaderPlant {
    pub intake: Arc<Mutex<MotorState>>,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub last: Duration,
    pub ring_present: bool,
    pub accumulated: Duration,
    pub feed_time: Duration,
    pub clear_time: Duration,
    pub present_mm: u32,
    pub empty_mm: u32,
}

impl LoaderPlant {
    fn step(&mut self) -> u32 {
        let now = self.clock.now();
        let dt = now.saturating_sub(self.last);
        self.last = now;

        let velocity = self.intake.lock().effective_velocity();
        if !self.ring_present && velocity > 0 {
            self.accumulated += dt;
            if self.accumulated >= self.feed_time {
                self.ring_present = true;
                self.accumulated = Duration::ZERO;
            }
        } else if self.ring_present && velocity < 0 {
            self.accumulated += dt;
            if self.accumulated >= self.clear_time {
                self.ring_present = false;
                self.accumulated = Duration::ZERO;
            }
        }

        if self.ring_present {
            self.present_mm
        } else {
            self.empty_mm
        }
    }
}

pub(crate) struct DistanceState {
    pub distance: u32,
    pub fault: Option<HalError>,
    pub plant: Option<LoaderPlant>,
}

/// Mock 距离传感器
#[derive(Clone)]
pub struct MockDistance {
    pub(crate) state: Arc<Mutex<DistanceState>>,
}

impl MockDistance {
    pub fn new(initial: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(DistanceState {
                distance: initial,
                fault: None,
                plant: None,
            })),
        }
    }

    pub fn set(&self, distance: u32) {
        let mut state = self.state.lock();
        state.distance = distance;
        state.fault = None;
    }

    pub fn set_fault(&self, error: HalError) {
        self.state.lock().fault = Some(error);
    }
}

impl DistanceSensor for MockDistance {
    fn distance(&self) -> Result<u32, HalError> {
        let mut state = self.state.lock();
        if let Some(err) = &state.fault {
            return Err(err.clone());
        }
        if let Some(plant) = state.plant.as_mut() {
            let reading = plant.step();
            state.distance = reading;
        }
        Ok(state.distance)
    }
}

impl std::fmt::Debug for MockDistance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockDistance")
            .field("distance", &state.distance)
            .field("fault", &state.fault)
            .finish()
    }
}

// ==================== 手柄 ====================

#[derive(Debug, Default)]
struct GamepadState {
    axes: HashMap<Axis, i32>,
    held: HashSet<Button>,
}

/// Mock 手柄
#[derive(Debug, Clone, Default)]
pub struct MockGamepad {
    state: Arc<Mutex<GamepadState>>,
}

impl MockGamepad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_axis(&self, axis: Axis, value: i32) {
        self.state.lock().axes.insert(axis, value.clamp(-127, 127));
    }

    pub fn press(&self, button: Button) {
        self.state.lock().held.insert(button);
    }

    pub fn release(&self, button: Button) {
        self.state.lock().held.remove(&button);
    }

    pub fn release_all(&self) {
        self.state.lock().held.clear();
    }
}

impl Gamepad for MockGamepad {
    fn axis(&self, axis: Axis) -> i32 {
        self.state.lock().axes.get(&axis).copied().unwrap_or(0)
    }

    fn button(&self, button: Button) -> bool {
        self.state.lock().held.contains(&button)
    }
}
