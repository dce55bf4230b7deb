//! Core types, configuration, and logging for the scoring service.
//!
//! This crate provides the identifiers, domain structs, and environment-driven
//! configuration shared by every other crate in the workspace.
#![allow(dead_code)]

mod config;
mod domain;
mod id;

pub use config::Config;
pub use config::ConfigError;
pub use domain::Metric;
pub use domain::Round;
pub use domain::RoundId;
pub use domain::Submission;
pub use domain::SubmissionId;
pub use domain::UserId;
pub use domain::Verdict;
pub use id::ID;

/// Submission probabilities and statistical scores.
pub type Probability = f64;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================

/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Global shutdown flag, set by the Ctrl+C handler.
/// Workers check this between queue entries and exit after finishing the
/// current one (cooperative shutdown, per the concurrency model).
#[cfg(feature = "server")]
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

#[cfg(feature = "server")]
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
}

#[cfg(not(feature = "server"))]
pub fn interrupted() -> bool {
    false
}

/// Register the Ctrl+C handler. Workers finish their current entry, then
/// observe `interrupted()` and stop; durable queues redeliver anything
/// left un-acknowledged on the next process start.
#[cfg(feature = "server")]
pub fn graceful_shutdown() {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        log::warn!("shutdown requested, draining in-flight work...");
        INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
    });
}
