//! Process-wide tracing bootstrap.
//!
//! Library crates only emit; the binary owns initialization and teardown.
//! With `--debug` a non-blocking file layer writes to
//! `jitb_YYYYMMDD_HHMMSS.log` in the OS temp directory; the returned guard
//! must stay alive until exit or the tail of the log is lost.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

pub fn init(debug: bool) -> anyhow::Result<(LogGuard, Option<PathBuf>)> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if debug {
        let path = std::env::temp_dir().join(format!(
            "jitb_{}.log",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("cannot create debug log {}", path.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
        Ok((LogGuard { _file: Some(guard) }, Some(path)))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
        Ok((LogGuard { _file: None }, None))
    }
}
