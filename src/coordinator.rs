//! # コーディネーター
//!
//! 2つのワーカーを1度だけ起動し、試行を繰り返す。
//!
//! 1. XとYを0にリセットする。
//! 2. 両方のワーカーに開始の合図を送る。
//! 3. 両方のワーカーから完了の合図を受け取る。
//! 4. r1とr2がどちらも0であれば、リオーダーを検出したとみなす。
//!
//! `StopToken`が停止されるか`max_trials`に達するまでループする。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{debug, error, info};

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::fence::FenceMode;
use crate::trial::{Detection, DetectionCounter, TrialContext};
use crate::worker::{Role, run_worker};

/// 停止フラグ
///
/// クローンしたトークンは同じフラグを共有する。停止されない限り、実験の動作には影響しない。
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 実験の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub trials: u64,
    pub detections: u64,
    /// ワーカーが別の試行の状態を観測した回数。常に0であるべき。
    pub rendezvous_violations: u64,
    pub fence: FenceMode,
    pub pinned: bool,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reorders detected in {} trials (fence = {}, pinned = {}, rendezvous violations = {})",
            self.detections, self.trials, self.fence, self.pinned, self.rendezvous_violations
        )
    }
}

pub struct Harness {
    config: HarnessConfig,
    ctx: TrialContext,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            ctx: TrialContext::new(),
        }
    }

    /// 実験を実行する。検出するたびに`on_detection`を呼び出す。
    ///
    /// 同じ`Harness`で2つの実験を同時に走らせることはできない。終了後であれば再度呼び出せる。
    pub fn run<F>(&mut self, stop: &StopToken, mut on_detection: F) -> Result<Report, HarnessError>
    where
        F: FnMut(&Detection),
    {
        *self.ctx.exit.get_mut() = false;
        // 前回の実験がエラーで終わっていても、合図のカウントは0から始める。
        self.ctx.drain_signals();
        let config = &self.config;
        let ctx = &self.ctx;

        info!(
            fence = %config.fence,
            pin_to_single_core = config.pin_to_single_core,
            pin_core = config.pin_core,
            max_trials = ?config.max_trials,
            "starting reorder experiment"
        );

        thread::scope(|s| {
            let a = thread::Builder::new()
                .name(Role::A.name().to_string())
                .spawn_scoped(s, || run_worker(Role::A, ctx, config))
                .map_err(|source| HarnessError::Spawn {
                    role: Role::A.name(),
                    source,
                })?;
            let b = match thread::Builder::new()
                .name(Role::B.name().to_string())
                .spawn_scoped(s, || run_worker(Role::B, ctx, config))
            {
                Ok(b) => b,
                Err(source) => {
                    // Aは既に起動しているため、終了させてからエラーを返す。
                    // Bは存在しないので、`begin_b`には合図を送らない。
                    ctx.exit.store(true, Ordering::Relaxed);
                    ctx.begin_a.post();
                    let _ = a.join();
                    return Err(HarnessError::Spawn {
                        role: Role::B.name(),
                        source,
                    });
                }
            };

            let mut counter = DetectionCounter::new();
            let mut trials = 0u64;
            let mut rendezvous_violations = 0u64;

            for iteration in 1u64.. {
                if stop.is_stopped() || config.max_trials.is_some_and(|max| trials >= max) {
                    break;
                }

                ctx.reset(iteration);
                ctx.release_workers();
                ctx.await_workers();
                trials = iteration;

                let (stamp_a, stamp_b) = ctx.stamps();
                if stamp_a != iteration || stamp_b != iteration {
                    rendezvous_violations += 1;
                    error!(iteration, stamp_a, stamp_b, "worker observed another trial");
                }

                let (r1, r2) = ctx.results();
                if let Some(detection) = counter.record(iteration, r1, r2) {
                    debug!(count = detection.count, iteration, "reorder detected");
                    on_detection(&detection);
                }
            }

            shutdown(ctx);
            let a = a.join().map_err(|_| HarnessError::WorkerPanicked(Role::A.name()));
            let b = b.join().map_err(|_| HarnessError::WorkerPanicked(Role::B.name()));
            a?;
            b?;

            let report = Report {
                trials,
                detections: counter.detected(),
                rendezvous_violations,
                fence: config.fence,
                pinned: config.pin_to_single_core,
            };
            info!(%report, "experiment finished");
            Ok(report)
        })
    }
}

/// ワーカーに終了を指示する。`exit`は開始の合図より前に書き込むため、ワーカーは必ず観測する。
fn shutdown(ctx: &TrialContext) {
    ctx.exit.store(true, Ordering::Relaxed);
    ctx.release_workers();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_token_is_shared_between_clones() {
        let token = StopToken::new();
        let clone = token.clone();
        assert!(!clone.is_stopped());
        token.stop();
        assert!(clone.is_stopped());
    }

    #[test]
    fn runs_exactly_max_trials() {
        let mut harness = Harness::new(HarnessConfig::default().pinned(None).with_max_trials(500));
        let report = harness.run(&StopToken::new(), |_| {}).unwrap();
        assert_eq!(report.trials, 500);
        assert_eq!(report.rendezvous_violations, 0);
        assert!(report.detections <= report.trials);
    }

    #[test]
    fn stopped_token_runs_no_trials() {
        let token = StopToken::new();
        token.stop();
        let mut harness = Harness::new(HarnessConfig::default().pinned(None));
        let report = harness.run(&token, |_| panic!("no trial should run")).unwrap();
        assert_eq!(report.trials, 0);
        assert_eq!(report.detections, 0);
    }

    #[test]
    fn harness_can_run_again_after_finishing() {
        let mut harness = Harness::new(HarnessConfig::default().pinned(None).with_max_trials(100));
        let first = harness.run(&StopToken::new(), |_| {}).unwrap();
        let second = harness.run(&StopToken::new(), |_| {}).unwrap();
        assert_eq!(first.trials, 100);
        assert_eq!(second.trials, 100);
        assert_eq!(second.rendezvous_violations, 0);
    }

    #[test]
    fn leftover_start_signal_does_not_shift_trials() {
        let mut harness = Harness::new(HarnessConfig::default().pinned(None).with_max_trials(1000));
        // Bの起動に失敗した後と同じ状態: `begin_b`に消費されない合図が1つ残っている。
        harness.ctx.begin_b.post();
        let report = harness.run(&StopToken::new(), |_| {}).unwrap();
        assert_eq!(report.trials, 1000);
        assert_eq!(report.rendezvous_violations, 0);
        assert_eq!(harness.ctx.begin_b.count(), 0);
    }

    #[test]
    fn leftover_completion_signal_is_discarded() {
        let mut harness = Harness::new(HarnessConfig::default().pinned(None).with_max_trials(1000));
        harness.ctx.end.post();
        let report = harness.run(&StopToken::new(), |_| {}).unwrap();
        assert_eq!(report.rendezvous_violations, 0);
        assert_eq!(harness.ctx.end.count(), 0);
    }

    #[test]
    fn report_summary() {
        let report = Report {
            trials: 10,
            detections: 2,
            rendezvous_violations: 0,
            fence: FenceMode::Compiler,
            pinned: false,
        };
        assert_eq!(
            report.to_string(),
            "2 reorders detected in 10 trials (fence = compiler, pinned = false, rendezvous violations = 0)"
        );
    }
}
