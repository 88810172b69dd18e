use crate::fence::FenceMode;

/// 実験の設定
///
/// `Default`はcargoのfeature（`hardware-fence`、`pin-single-core`）に従う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// 書き込みと読み込みの間に置くバリア
    pub fence: FenceMode,
    /// 2つのワーカーを同じCPUに固定するかどうか（ベストエフォート）
    pub pin_to_single_core: bool,
    /// 固定先のCPU番号
    pub pin_core: usize,
    /// ワーカーA、Bの乱数シード
    pub seeds: [u32; 2],
    /// 試行回数の上限。`None`の場合は停止されるまで続ける。
    pub max_trials: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fence: FenceMode::default(),
            pin_to_single_core: cfg!(feature = "pin-single-core"),
            pin_core: 0,
            seeds: [1, 2],
            max_trials: None,
        }
    }
}

impl HarnessConfig {
    pub fn with_fence(mut self, fence: FenceMode) -> Self {
        self.fence = fence;
        self
    }

    pub fn pinned(mut self, core: Option<usize>) -> Self {
        self.pin_to_single_core = core.is_some();
        self.pin_core = core.unwrap_or(0);
        self
    }

    pub fn with_seeds(mut self, a: u32, b: u32) -> Self {
        self.seeds = [a, b];
        self
    }

    pub fn with_max_trials(mut self, max_trials: u64) -> Self {
        self.max_trials = Some(max_trials);
        self
    }
}
