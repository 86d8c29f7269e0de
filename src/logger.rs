//! Log dispatch setup

use owo_colors::{OwoColorize, Style};
use std::path::Path;

/// Where log lines end up
pub enum LogTarget<'a> {
    /// Colored output on stderr, used by the plain CLI commands
    Stderr,
    /// Plain output appended to a file, used while a TUI owns the terminal
    File(&'a Path),
}

pub fn setup_logger(level: Option<log::LevelFilter>, target: LogTarget<'_>) -> anyhow::Result<()> {
    let colored = matches!(target, LogTarget::Stderr);
    let dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            if colored {
                let style = match record.level() {
                    log::Level::Trace => Style::new().purple(),
                    log::Level::Debug => Style::new().blue(),
                    log::Level::Warn => Style::new().yellow(),
                    log::Level::Error => Style::new().red(),
                    log::Level::Info => Style::new().bright_green(),
                };
                out.finish(format_args!(
                    "{:<5} {} {} {}",
                    record.level().style(style),
                    record.target(),
                    "~".fg_rgb::<128, 128, 128>(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "{} {:<5} {} ~ {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.target(),
                    message
                ))
            }
        })
        .level(log::LevelFilter::Off)
        .level_for("ip_atlas", level.unwrap_or(log::LevelFilter::Info));

    match target {
        LogTarget::Stderr => dispatch.chain(std::io::stderr()).apply()?,
        LogTarget::File(path) => dispatch.chain(fern::log_file(path)?).apply()?,
    }
    Ok(())
}
