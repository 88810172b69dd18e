//! # 試行の共有状態
//!
//! コーディネーターが所有し、2つのワーカーに参照で貸し出す。
//!
//! * `x`、`y`: ワーカーが書き込み、相手のワーカーが読み込むフラグ。
//!   同期していない（Relaxed）アクセスそのものが実験対象である。
//! * `r1`、`r2`: 各ワーカーが読み込んだ値。コーディネーターは`end`を2回待った後に読む。
//! * `begin_a`、`begin_b`、`end`: ランデブーのためのセマフォ。
//!
//! ```text
//! coordinator                 worker A                  worker B
//! -----------                 --------                  --------
//! X = 0; Y = 0;
//! post(begin_a) ─────────────> wait(begin_a)
//! post(begin_b) ─────────────────────────────────────> wait(begin_b)
//!                              spin_delay()              spin_delay()
//!                              X = 1                     Y = 1
//!                              barrier                   barrier
//!                              r1 = Y                    r2 = X
//! wait(end) <───────────────── post(end)
//! wait(end) <─────────────────────────────────────────── post(end)
//! r1 == 0 && r2 == 0 ?
//! ```

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::semaphore::Semaphore;

#[derive(Default)]
pub struct TrialContext {
    pub(crate) x: AtomicU32,
    pub(crate) y: AtomicU32,
    pub(crate) r1: AtomicU32,
    pub(crate) r2: AtomicU32,

    pub(crate) begin_a: Semaphore,
    pub(crate) begin_b: Semaphore,
    pub(crate) end: Semaphore,

    /// 現在の試行番号（1始まり）。`begin_*`の`post()`より前に書き込む。
    pub(crate) trial: AtomicU64,
    /// ワーカーが開始時に読んだ試行番号
    pub(crate) stamp_a: AtomicU64,
    pub(crate) stamp_b: AtomicU64,

    /// ワーカーの終了指示。コーディネーターだけが書き込む。
    pub(crate) exit: AtomicBool,
}

impl TrialContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 試行の準備。フラグをリセットし、試行番号を公開する。
    ///
    /// ここでの書き込みはRelaxedでよい。続く`begin_*`の`post()`（Release）と
    /// ワーカーの`wait()`（Acquire）によって、ワーカーの書き込みより前に観測される。
    pub(crate) fn reset(&self, trial: u64) {
        self.x.store(0, Ordering::Relaxed);
        self.y.store(0, Ordering::Relaxed);
        self.trial.store(trial, Ordering::Relaxed);
    }

    /// 前回の実験で消費されなかった合図を捨てる。
    /// ワーカーが起動していない間に呼び出すこと。
    pub(crate) fn drain_signals(&self) {
        for sema in [&self.begin_a, &self.begin_b, &self.end] {
            while sema.try_wait() {}
        }
    }

    pub(crate) fn release_workers(&self) {
        self.begin_a.post();
        self.begin_b.post();
    }

    pub(crate) fn await_workers(&self) {
        // どちらが先に終わってもよい。
        self.end.wait();
        self.end.wait();
    }

    pub(crate) fn results(&self) -> (u32, u32) {
        (
            self.r1.load(Ordering::Relaxed),
            self.r2.load(Ordering::Relaxed),
        )
    }

    pub(crate) fn stamps(&self) -> (u64, u64) {
        (
            self.stamp_a.load(Ordering::Relaxed),
            self.stamp_b.load(Ordering::Relaxed),
        )
    }
}

/// リオーダーの検出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// 何回目の検出か（1始まり）
    pub count: u64,
    /// 検出した試行番号（1始まり）
    pub iteration: u64,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reorders detected after {} iterations",
            self.count, self.iteration
        )
    }
}

impl Detection {
    /// 標準出力に出す1行を書き出す。
    pub fn write_line<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{self}")
    }
}

#[derive(Debug, Default)]
pub struct DetectionCounter {
    detected: u64,
}

impl DetectionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// r1とr2がどちらも0であれば、どちらのワーカーも相手の書き込みより前に読み込んだことになる。
    /// 1回の試行で増えるのは高々1である。
    pub fn record(&mut self, iteration: u64, r1: u32, r2: u32) -> Option<Detection> {
        if r1 == 0 && r2 == 0 {
            self.detected += 1;
            Some(Detection {
                count: self.detected,
                iteration,
            })
        } else {
            None
        }
    }

    pub fn detected(&self) -> u64 {
        self.detected
    }
}
