//! 取环滚筒控制器
//!
//! 手动意图直接映射为固定速度；`AutoFeed` 根据两个取环位距离传感器决定方向：
//! 两个位都空时慢速正转送环，任一位有环时反转清位。
//! 自动送环不锁存，每个周期都按最新读数重新判断。

use crate::config::{IntakeConfig, LoaderConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 取环意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeIntent {
    #[default]
    Off,
    ManualForward,
    ManualReverse,
    /// 按取环位传感器自动送环/清位
    AutoFeed,
    /// 指定速度（RPM，带符号）
    Run(i32),
}

/// 取环位占用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderOccupancy {
    /// 两个取环位都为空
    Clear,
    /// 至少一个取环位有环
    Occupied,
}

impl LoaderOccupancy {
    /// 根据两路距离读数判断占用状态
    ///
    /// 读数不大于阈值即视为有环。任一路读取失败时返回 `None`。
    pub fn classify(readings: [Option<u32>; 2], threshold_mm: u32) -> Option<Self> {
        let [a, b] = readings;
        let (a, b) = (a?, b?);
        if a <= threshold_mm || b <= threshold_mm {
            Some(LoaderOccupancy::Occupied)
        } else {
            Some(LoaderOccupancy::Clear)
        }
    }
}

/// 取环状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeState {
    pub intent: IntakeIntent,
    /// 本周期命令速度
    pub velocity: i32,
    /// 本周期取环位状态（传感器故障时为 `None`）
    pub occupancy: Option<LoaderOccupancy>,
}

/// 取环控制器
#[derive(Debug, Clone)]
pub struct IntakeController {
    config: IntakeConfig,
    occupancy_threshold_mm: u32,
    intent: IntakeIntent,
    velocity: i32,
    occupancy: Option<LoaderOccupancy>,
    loader_fault: bool,
}

impl IntakeController {
    pub fn new(config: IntakeConfig, loader: &LoaderConfig) -> Self {
        Self {
            config,
            occupancy_threshold_mm: loader.occupancy_threshold_mm,
            intent: IntakeIntent::Off,
            velocity: 0,
            occupancy: None,
            loader_fault: false,
        }
    }

    pub fn intent(&self) -> IntakeIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: IntakeIntent) {
        if intent != self.intent {
            debug!(from = ?self.intent, to = ?intent, "intake intent");
            self.intent = intent;
        }
    }

    pub fn occupancy(&self) -> Option<LoaderOccupancy> {
        self.occupancy
    }

    pub fn state(&self) -> IntakeState {
        IntakeState {
            intent: self.intent,
            velocity: self.velocity,
            occupancy: self.occupancy,
        }
    }

    /// 计算一个控制周期的滚筒速度
    pub fn tick(&mut self, loader: [Option<u32>; 2]) -> i32 {
        let occupancy = LoaderOccupancy::classify(loader, self.occupancy_threshold_mm);
        match (occupancy.is_none(), self.loader_fault) {
            (true, false) => {
                // 只有自动送环依赖取环位读数
                if self.intent == IntakeIntent::AutoFeed {
                    warn!(?loader, "loader distance sensor unavailable, stopping auto feed");
                } else {
                    debug!(?loader, "loader distance sensor unavailable");
                }
                self.loader_fault = true;
            },
            (false, true) => {
                debug!("loader distance sensor recovered");
                self.loader_fault = false;
            },
            _ => {},
        }
        self.occupancy = occupancy;

        let velocity = match self.intent {
            IntakeIntent::Off => 0,
            IntakeIntent::ManualForward => self.config.forward_speed,
            IntakeIntent::ManualReverse => -self.config.reverse_speed,
            IntakeIntent::Run(rpm) => rpm,
            IntakeIntent::AutoFeed => match occupancy {
                Some(LoaderOccupancy::Clear) => self.config.feed_speed,
                Some(LoaderOccupancy::Occupied) => -self.config.clear_speed,
                None => 0,
            },
        };

        self.velocity = velocity;
        velocity
    }
}
