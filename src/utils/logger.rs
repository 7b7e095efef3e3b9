//! 日志初始化
//!
//! `RUST_LOG` 环境变量优先；未设置时回退到传入的级别 (默认 info)。
//! 提供日志目录时按天滚动写入文件，否则输出到终端。

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with terminal output
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger, optionally writing to `log_dir`
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&Path>) {
    let fallback = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && dir.exists()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "approval-server");
        subscriber.with_writer(file_appender).init();
        return;
    }

    subscriber.init();
}
