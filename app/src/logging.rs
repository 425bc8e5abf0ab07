//! FILENAME: app/src/logging.rs
// PURPOSE: Diagnostic sink initialization for the shell.

use std::io::Write;

/// Initialize the process-wide logger. Defaults to `info`; `RUST_LOG`
/// overrides. Lines carry level and target so script output (target
/// `script`) stays distinguishable from launcher diagnostics.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}|{}|{}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}
