use std::io::Write;

/// Installs the env_logger backend for the `log` facade. `RUST_LOG` overrides the
/// default `info` filter. Safe to call more than once.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{:<5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

/// Test-friendly variant: captured by the test harness, never panics on reinit.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
