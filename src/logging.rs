//! tracing の初期化

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// グローバルな tracing subscriber を設定
///
/// `RUST_LOG` があればそれを使い、なければ `--verbose` で debug、通常は warn。
/// 出力は stderr（stdout は結果表示用）。
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "video_cv_client=debug,video_cv_common=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
