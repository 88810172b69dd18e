//! # ワーカー
//!
//! AとBは対称で、書き込むフラグと読み込むフラグが入れ替わっているだけである。
//!
//! | ロール | 書き込み | 読み込み | 結果 |
//! | --- | --- | --- | --- |
//! | A | X | Y | r1 |
//! | B | Y | X | r2 |

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::affinity;
use crate::config::HarnessConfig;
use crate::fence::FenceMode;
use crate::mersenne::MersenneTwister;
use crate::semaphore::Semaphore;
use crate::trial::TrialContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    A,
    B,
}

/// ワーカーが使うセルの組
struct Cells<'a> {
    begin: &'a Semaphore,
    own: &'a AtomicU32,
    other: &'a AtomicU32,
    result: &'a AtomicU32,
    stamp: &'a AtomicU64,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::A => "worker-a",
            Role::B => "worker-b",
        }
    }

    pub fn seed(self, config: &HarnessConfig) -> u32 {
        match self {
            Role::A => config.seeds[0],
            Role::B => config.seeds[1],
        }
    }

    fn cells(self, ctx: &TrialContext) -> Cells<'_> {
        match self {
            Role::A => Cells {
                begin: &ctx.begin_a,
                own: &ctx.x,
                other: &ctx.y,
                result: &ctx.r1,
                stamp: &ctx.stamp_a,
            },
            Role::B => Cells {
                begin: &ctx.begin_b,
                own: &ctx.y,
                other: &ctx.x,
                result: &ctx.r2,
                stamp: &ctx.stamp_b,
            },
        }
    }
}

/// ワーカーのループ。コーディネーターが`exit`を立てて開始の合図を送るまで戻らない。
pub fn run_worker(role: Role, ctx: &TrialContext, config: &HarnessConfig) {
    if config.pin_to_single_core {
        match affinity::pin_current_thread(config.pin_core) {
            Ok(()) => debug!(worker = role.name(), core = config.pin_core, "pinned"),
            Err(e) => warn!(
                worker = role.name(),
                core = config.pin_core,
                allowed = ?affinity::allowed_cores(),
                error = %e,
                "could not pin worker, continuing unpinned"
            ),
        }
    }

    let mut random = MersenneTwister::new(role.seed(config));
    let cells = role.cells(ctx);
    let fence = config.fence;

    loop {
        // 開始の合図を待つ。
        cells.begin.wait();
        if ctx.exit.load(Ordering::Relaxed) {
            debug!(worker = role.name(), "exiting");
            return;
        }
        let trial = ctx.trial.load(Ordering::Relaxed);

        // ランダムな遅延
        random.spin_delay();

        transact(&cells, fence);

        cells.stamp.store(trial, Ordering::Relaxed);
        // 完了を通知する。
        ctx.end.post();
    }
}

/// 書き込み → バリア → 読み込み
///
/// 自分のフラグへの書き込みと相手のフラグの読み込みは同期していない。
/// `FenceMode::Compiler`ではCPUがストアをロードの後ろに並び替えることがある。
#[inline(never)]
fn transact(cells: &Cells<'_>, fence: FenceMode) {
    cells.own.store(1, Ordering::Relaxed);
    fence.apply();
    let value = cells.other.load(Ordering::Relaxed);
    cells.result.store(value, Ordering::Relaxed);
}
