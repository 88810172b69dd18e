use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// 既定のログレベル。`RUST_LOG`で上書きできる。
const DEFAULT_FILTER: &str = "info";

/// ログを標準エラー出力に出す。標準出力は検出結果の行のために空けておく。
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    // テストなどで既に登録されている場合は何もしない。
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
