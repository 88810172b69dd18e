//! # バリアの強さ
//!
//! ワーカーが「書き込み → 読み込み」の間に置くバリアである。
//!
//! | モード | 抑制するもの | 発行される命令 |
//! | --- | --- | --- |
//! | `Compiler` | コンパイラによる並び替え | なし |
//! | `Hardware` | コンパイラとCPUによる並び替え | `mfence`（x86）、`dmb ish`（aarch64）など |
//!
//! 両方のスレッドが`Hardware`（SeqCstフェンス）を使う場合、SeqCstフェンスは全スレッドで
//! 共通の1つの順序に並ぶため、r1とr2が同時に0になることはない。

use std::fmt;
use std::sync::atomic::{Ordering, compiler_fence, fence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceMode {
    /// コンパイラのみを抑制する。CPUによるストア→ロードの並び替えは観測され得る。
    Compiler,
    /// SeqCstフェンス
    Hardware,
}

impl FenceMode {
    #[inline(always)]
    pub fn apply(self) {
        match self {
            FenceMode::Compiler => compiler_fence(Ordering::SeqCst),
            FenceMode::Hardware => fence(Ordering::SeqCst),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FenceMode::Compiler => "compiler",
            FenceMode::Hardware => "hardware",
        }
    }
}

impl Default for FenceMode {
    fn default() -> Self {
        if cfg!(feature = "hardware-fence") {
            FenceMode::Hardware
        } else {
            FenceMode::Compiler
        }
    }
}

impl fmt::Display for FenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
