//! 按键按下沿检测

/// 上升沿检测器
///
/// 只在电平从低变高的那一个周期返回 `true`，按住不放不会重复触发。
#[derive(Debug, Clone, Copy, Default)]
pub struct RisingEdge {
    last: bool,
}

impl RisingEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// 输入本周期电平，返回是否为新按下
    pub fn update(&mut self, level: bool) -> bool {
        let rising = level && !self.last;
        self.last = level;
        rising
    }

    pub fn reset(&mut self) {
        self.last = false;
    }
}
