//! 底盘运动控制器接口
//!
//! 轨迹生成、里程计融合和 PID 都在外部运动库里完成，这里只定义决策层用到的接口：
//! - 下发点到点、位姿、航向三种运动命令（异步执行，立即返回）
//! - 查询当前命令的完成进度（0-100）
//! - 遥控阶段的 arcade 直接驱动
//!
//! `waitUntilDone` / `waitUntil(progress)` 由调用方轮询 [`MotionController::is_in_motion`]
//! 和 [`MotionController::progress`] 组合实现，这样等待期间调用方还能继续驱动其它子系统。

use std::time::Duration;

/// 场地坐标点（英寸）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 机器人位姿（英寸，航向为度，顺时针为正）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// 原地转向方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AngularDirection {
    Clockwise,
    Counterclockwise,
}

/// 运动命令选项
///
/// 速度单位与手柄摇杆一致（0-127）。未设置的字段由运动控制器使用自身默认值。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionOptions {
    /// 是否车头朝前行驶（false 表示倒车）
    pub forwards: bool,
    /// 最大速度
    pub max_speed: Option<f64>,
    /// 最小速度（用于运动链之间不减速到 0）
    pub min_speed: Option<f64>,
    /// 转向方向（仅 `turn_to_heading` 使用，`None` 表示走最短路径）
    pub direction: Option<AngularDirection>,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            forwards: true,
            max_speed: None,
            min_speed: None,
            direction: None,
        }
    }
}

impl MotionOptions {
    pub fn backwards() -> Self {
        Self {
            forwards: false,
            ..Self::default()
        }
    }

    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    pub fn with_min_speed(mut self, min_speed: f64) -> Self {
        self.min_speed = Some(min_speed);
        self
    }

    pub fn with_direction(mut self, direction: AngularDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// 底盘运动控制器
///
/// 所有运动命令都是异步的：调用立即返回，运动在控制器自己的执行上下文中进行。
/// 新命令会替换正在执行的命令。
pub trait MotionController {
    /// 移动到场地上的点（不关心终点航向）
    fn move_to_point(&mut self, target: Point, timeout: Duration, options: MotionOptions);

    /// 移动到位姿（终点航向也要满足）
    fn move_to_pose(&mut self, target: Pose, timeout: Duration, options: MotionOptions);

    /// 原地转到指定航向（度）
    fn turn_to_heading(&mut self, heading: f64, timeout: Duration, options: MotionOptions);

    /// 遥控 arcade 驱动（油门、转向，-127..=127）
    fn arcade(&mut self, throttle: i32, turn: i32);

    /// 当前位姿估计
    fn pose(&self) -> Pose;

    /// 是否有运动命令正在执行（到达目标或超时后为 false）
    fn is_in_motion(&self) -> bool;

    /// 当前命令完成进度（0-100），空闲时为 `None`
    fn progress(&self) -> Option<f64>;

    /// 立即终止当前命令
    fn cancel(&mut self);
}
