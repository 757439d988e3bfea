//! Structured diagnostics for the encode and decode pipelines.
//!
//! The `log_metric!` macro emits a single key/value record through the `log`
//! facade at `debug` level. The `#[cfg(debug_assertions)]` guard compiles every
//! call site out of release builds.

/// Logs a structured key-value metric record, only in debug builds.
///
/// # Example
/// ```
/// use deltacodec::log_metric;
/// let blocks = 4;
/// log_metric!("event"="encode_vector", "vector"=0, "blocks"=&blocks);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("DELTACODEC_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

//==================================================================================
// Logger Bootstrap
//==================================================================================

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` at `Info` level (`Debug` in debug builds), printing
/// `[LEVEL] message`. With `log_file`, records are appended to that file
/// instead of stderr. Only the first call has any effect, and a logger that
/// some other component already installed is left in place.
pub fn enable_verbose_logging(log_file: Option<&str>) {
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(filename) = log_file {
            match OpenOptions::new().append(true).create(true).open(filename) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => eprintln!("[WARN] could not open log file {}: {}; logging to stderr", filename, e),
            }
        }

        let _ = builder.try_init();
    });
}
