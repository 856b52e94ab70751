//! 移动目标夹爪
//!
//! 夹爪由一个主气缸和两个预压气缸组成。闭合必须分两步：
//! 先打开两个预压气缸，等待 `settle_delay` 后再闭合主气缸；
//! 释放时三个输出在同一个周期内全部关闭（主气缸在前）。
//!
//! 等待通过周期驱动的状态机实现（`Staging` 状态 + 时钟），
//! 不会阻塞调用方，其他子系统在等待期间照常更新。
//!
//! ```text
//! Unlatched --latch--> Staging --settle_delay--> Latched
//!     ^                   |                          |
//!     +------release------+----------release---------+
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 夹爪请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampRequest {
    Latch,
    Release,
    /// 切换：已闭合则释放，未闭合则闭合
    Toggle,
}

/// 夹爪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClampState {
    #[default]
    Unlatched,
    /// 预压气缸已打开，等待主气缸闭合
    Staging { since: Duration },
    Latched,
}

/// 需要写到气缸输出上的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampAction {
    /// 打开两个预压气缸
    Stage,
    /// 闭合主气缸
    Engage,
    /// 关闭全部三个输出
    Release,
}

/// 夹爪控制器
#[derive(Debug, Clone)]
pub struct ClampController {
    settle_delay: Duration,
    state: ClampState,
    ignored_toggles: u32,
}

impl ClampController {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            settle_delay,
            state: ClampState::Unlatched,
            ignored_toggles: 0,
        }
    }

    pub fn state(&self) -> ClampState {
        self.state
    }

    pub fn is_latched(&self) -> bool {
        self.state == ClampState::Latched
    }

    /// 是否处于两步闭合的中间状态
    pub fn is_staging(&self) -> bool {
        matches!(self.state, ClampState::Staging { .. })
    }

    /// 闭合过程中被忽略的切换次数
    pub fn ignored_toggles(&self) -> u32 {
        self.ignored_toggles
    }

    /// 处理一次请求，返回需要立即执行的输出动作
    ///
    /// - 闭合中再次切换会被忽略（不会打断正在进行的两步闭合）
    /// - 显式释放在任何状态下都会关闭全部输出
    pub fn request(&mut self, request: ClampRequest, now: Duration) -> Option<ClampAction> {
        let request = match (request, self.state) {
            (ClampRequest::Toggle, ClampState::Latched) => ClampRequest::Release,
            (ClampRequest::Toggle, ClampState::Unlatched) => ClampRequest::Latch,
            (ClampRequest::Toggle, ClampState::Staging { .. }) => {
                self.ignored_toggles += 1;
                debug!(ignored = self.ignored_toggles, "clamp toggle ignored while staging");
                return None;
            },
            (request, _) => request,
        };

        match (request, self.state) {
            (ClampRequest::Latch, ClampState::Unlatched) => {
                debug!(?now, "clamp staging");
                self.state = ClampState::Staging { since: now };
                Some(ClampAction::Stage)
            },
            (ClampRequest::Latch, _) => None,
            (ClampRequest::Release, state) => {
                debug!(?now, from = ?state, "clamp release");
                self.state = ClampState::Unlatched;
                Some(ClampAction::Release)
            },
            (ClampRequest::Toggle, _) => None,
        }
    }

    /// 周期推进：预压等待结束后闭合主气缸
    pub fn tick(&mut self, now: Duration) -> Option<ClampAction> {
        match self.state {
            ClampState::Staging { since } if now.saturating_sub(since) >= self.settle_delay => {
                debug!(?now, "clamp engaged");
                self.state = ClampState::Latched;
                Some(ClampAction::Engage)
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(150);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_latch_is_two_stage() {
        let mut clamp = ClampController::new(SETTLE);

        assert_eq!(clamp.request(ClampRequest::Latch, ms(0)), Some(ClampAction::Stage));
        assert!(clamp.is_staging());

        assert_eq!(clamp.tick(ms(10)), None);
        assert_eq!(clamp.tick(ms(149)), None);
        assert_eq!(clamp.tick(ms(150)), Some(ClampAction::Engage));
        assert!(clamp.is_latched());
        assert_eq!(clamp.tick(ms(160)), None);
    }

    #[test]
    fn test_toggle_alternates() {
        let mut clamp = ClampController::new(SETTLE);

        assert_eq!(clamp.request(ClampRequest::Toggle, ms(0)), Some(ClampAction::Stage));
        clamp.tick(ms(150));
        assert_eq!(clamp.request(ClampRequest::Toggle, ms(200)), Some(ClampAction::Release));
        assert_eq!(clamp.state(), ClampState::Unlatched);
    }

    #[test]
    fn test_toggle_ignored_while_staging() {
        let mut clamp = ClampController::new(SETTLE);
        clamp.request(ClampRequest::Toggle, ms(0));

        assert_eq!(clamp.request(ClampRequest::Toggle, ms(50)), None);
        assert_eq!(clamp.ignored_toggles(), 1);
        // 原来的闭合计时不受影响
        assert_eq!(clamp.tick(ms(150)), Some(ClampAction::Engage));
    }

    #[test]
    fn test_release_aborts_staging() {
        let mut clamp = ClampController::new(SETTLE);
        clamp.request(ClampRequest::Latch, ms(0));

        assert_eq!(clamp.request(ClampRequest::Release, ms(50)), Some(ClampAction::Release));
        assert_eq!(clamp.tick(ms(200)), None);
        assert_eq!(clamp.state(), ClampState::Unlatched);
    }

    #[test]
    fn test_latch_when_latched_is_noop() {
        let mut clamp = ClampController::new(SETTLE);
        clamp.request(ClampRequest::Latch, ms(0));
        clamp.tick(ms(150));

        assert_eq!(clamp.request(ClampRequest::Latch, ms(300)), None);
        assert!(clamp.is_latched());
    }
}
