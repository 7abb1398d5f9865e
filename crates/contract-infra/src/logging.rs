//! Log plano de la aplicación sobre `tracing-subscriber`: cada registro se
//! añade al archivo como `[YYYY-mm-dd HH:MM:SS] mensaje` y, si se pide, se
//! copia a stdout. Los `log::info!` de las demás crates llegan por el puente
//! `tracing-log` que instala `try_init`.

use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use contract_domain::{format_timestamp, now_local};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::AppConfig;

/// Línea tal como queda en el archivo.
pub fn format_line(at: NaiveDateTime, message: &str) -> String {
    format!("[{}] {message}", format_timestamp(&at))
}

/// Formato de una línea: marca de tiempo local entre corchetes y el mensaje,
/// sin nivel ni target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatLine;

impl<S, N> FormatEvent<S, N> for FlatLine
    where S: Subscriber + for<'a> LookupSpan<'a>,
          N: for<'a> FormatFields<'a> + 'static
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        write!(writer, "[{}] ", format_timestamp(&now_local()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Capa `fmt` con formato plano sobre cualquier destino.
pub fn flat_layer<S, W>(writer: W) -> tracing_subscriber::fmt::Layer<S, DefaultFields, FlatLine, W>
    where S: Subscriber + for<'a> LookupSpan<'a>,
          W: for<'w> MakeWriter<'w> + 'static
{
    tracing_subscriber::fmt::layer().event_format(FlatLine).with_writer(writer)
}

fn level_filter(level: log::LevelFilter) -> LevelFilter {
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

/// Instala el subscriber global una sola vez; `false` si ya había otro. Con
/// `echo = false` sólo se escribe el archivo. Si el archivo no se puede abrir
/// se sigue sin él.
pub fn init_logging(config: &AppConfig, echo: bool) -> bool {
    let file = match OpenOptions::new().create(true).append(true).open(&config.log_file) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("log file {} unavailable: {e}", config.log_file.display());
            None
        }
    };
    tracing_subscriber::registry().with(level_filter(config.log_level))
                                  .with(file.map(|f| flat_layer(Mutex::new(f))))
                                  .with(echo.then(|| flat_layer(std::io::stdout)))
                                  .try_init()
                                  .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_domain::parse_timestamp;

    #[test]
    fn line_has_bracketed_timestamp() {
        let at = parse_timestamp("2025-03-03 10:00:00").unwrap();
        assert_eq!(format_line(at, "Пользователь admin вошел в систему"),
                   "[2025-03-03 10:00:00] Пользователь admin вошел в систему");
    }

    #[test]
    fn appends_records_at_or_above_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_log.txt");
        std::fs::write(&path, "[2025-01-01 00:00:00] earlier\n").unwrap();
        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let subscriber = tracing_subscriber::registry().with(LevelFilter::INFO)
                                                       .with(flat_layer(Mutex::new(file)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("first");
            tracing::debug!("hidden");
            tracing::warn!("second");
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[2025-01-01 00:00:00] earlier");
        assert!(lines[1].starts_with('[') && lines[1].ends_with("] first"), "{}", lines[1]);
        assert!(lines[2].ends_with("] second"));
        // "[YYYY-mm-dd HH:MM:SS] " ocupa 22 bytes
        assert_eq!(lines[1].len(), 22 + "first".len());
    }

    #[test]
    fn level_filter_follows_config() {
        assert_eq!(level_filter(log::LevelFilter::Warn), LevelFilter::WARN);
        assert_eq!(level_filter(log::LevelFilter::Off), LevelFilter::OFF);
    }
}
