use std::io;

use reorder_harness::{Harness, HarnessConfig, StopToken, logging};
use tracing::error;

fn main() {
    logging::init_logging();

    // 引数は取らない。バリアとCPU固定はcargoのfeatureで切り替える。
    let mut harness = Harness::new(HarnessConfig::default());

    // 停止されることはなく、外部からプロセスが終了されるまで実行し続ける。
    let stop = StopToken::new();
    let mut stdout = io::stdout().lock();
    let result = harness.run(&stop, |detection| {
        if let Err(e) = detection.write_line(&mut stdout) {
            error!(error = %e, "failed to write to stdout");
            std::process::exit(1);
        }
    });
    if let Err(e) = result {
        error!(error = %e, "reorder experiment failed to start");
        std::process::exit(1);
    }
}
