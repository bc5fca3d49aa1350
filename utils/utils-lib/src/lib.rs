//! Small helpers shared by every binary in the workspace: package/version
//! banners and the timeout/period defaults quoted throughout the component
//! design (spec.md §4, §5).

/// Default HTTP timeout for a single-object request (spec.md §5).
pub const DEFAULT_SINGLE_TIMEOUT: &str = "10s";
/// Default HTTP timeout for a list request (spec.md §5).
pub const DEFAULT_LIST_TIMEOUT: &str = "30s";
/// Default deadline for one alarm dictionary synchronization pass (spec.md §4.4).
pub const DICTIONARY_SYNC_DEADLINE: &str = "5m";
/// Default period of the outbox catch-up sweep (spec.md §4.6).
pub const CATCHUP_INTERVAL: &str = "15m";
/// Default number of retry attempts for a transport request (spec.md §4.1).
pub const DEFAULT_MAX_RETRIES: &str = "3";
/// Default base delay for the transport layer's exponential backoff (spec.md §4.1).
pub const DEFAULT_RETRY_BASE_DELAY: &str = "500ms";
/// Channel the outbox listener subscribes to (spec.md §6).
pub const OUTBOX_CHANNEL: &str = "alarm_event_record_outbox_queued";
/// Bound on the alarm dictionary synchronizer's per-type concurrency (spec.md §4.4).
pub const DICTIONARY_SYNC_CONCURRENCY: usize = 5;

/// Print `$name $version (rev $short_sha, built $profile)`-style banner.
///
/// Relies on cargo-set env vars only, so it works without a build script.
#[macro_export]
macro_rules! package_description {
    () => {
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
    };
}

/// Returns a short version string embedding the crate's semver.
#[macro_export]
macro_rules! version_info_str {
    () => {
        concat!("v", env!("CARGO_PKG_VERSION"))
    };
}

/// Print the package banner to stdout. Intended to be called once from each
/// binary's `main` before argument parsing finishes, matching the teacher's
/// `utils::print_package_info!()` call at the top of `server()`.
#[macro_export]
macro_rules! print_package_info {
    () => {
        println!("{}", $crate::package_description!());
    };
}

/// Initialise a `tracing` subscriber reading its filter from `RUST_LOG`,
/// defaulting to `info` when unset. Every binary in the workspace calls this
/// exactly once, mirroring `utils::tracing_telemetry::init_tracing` in the
/// teacher, minus the OpenTelemetry/Jaeger exporter (no collector is assumed
/// to be present in this workspace's deployment footprint; see DESIGN.md).
pub fn init_tracing(service_name: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_span_events(fmt::format::FmtSpan::NONE)
        .init();
    tracing::info!(service = service_name, "tracing initialised");
}
