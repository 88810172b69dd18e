//! # reorder-harness
//!
//! 2つのスレッドの間で発生するメモリの並び替え（コンパイラによる命令の並び替え、
//! またはCPUのアウトオブオーダー実行）を、Dekker型の「ストアしてからロード」する競合で検出する。
//!
//! ```text
//! worker A            worker B
//! --------            --------
//! X = 1               Y = 1
//! barrier             barrier
//! r1 = Y              r2 = X
//! ```
//!
//! プログラム順のとおりに実行されれば、r1とr2の少なくとも一方は1になる。
//! r1 == 0 && r2 == 0 が観測された場合、どちらかのスレッドでストアがロードの後ろに並び替えられている。
//!
//! ```no_run
//! use reorder_harness::{FenceMode, Harness, HarnessConfig, StopToken};
//!
//! let config = HarnessConfig::default()
//!     .with_fence(FenceMode::Compiler)
//!     .with_max_trials(1_000_000);
//! let mut harness = Harness::new(config);
//! let report = harness
//!     .run(&StopToken::new(), |detection| println!("{detection}"))
//!     .unwrap();
//! println!("{report}");
//! ```

pub mod affinity;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fence;
pub mod logging;
pub mod mersenne;
pub mod semaphore;
pub mod trial;
pub mod worker;

pub use config::HarnessConfig;
pub use coordinator::{Harness, Report, StopToken};
pub use error::{AffinityError, HarnessError};
pub use fence::FenceMode;
pub use mersenne::MersenneTwister;
pub use semaphore::Semaphore;
pub use trial::{Detection, DetectionCounter, TrialContext};
pub use worker::Role;
