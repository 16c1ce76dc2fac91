//! Tracing setup for worker processes.

use std::fmt::Write as _;

use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, format};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Prefix on every text log line, so worker output can be told apart from
/// whatever the predictor prints.
pub const LOG_TAG: &str = "[COG]";

/// Initialize tracing with COG_LOG and LOG_FORMAT support.
///
/// `RUST_LOG` wins when set. Logs go to stderr so stdout stays free for the
/// predictor. Calling this twice is harmless.
pub fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directives(std::env::var("COG_LOG").ok().as_deref()))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .event_format(Tagged(format::Format::default()))
                    .with_writer(std::io::stderr),
            );
        let _ = subscriber.try_init();
    }
}

/// Writes [`LOG_TAG`] ahead of the wrapped formatter's line.
struct Tagged<F>(F);

impl<S, N, F> FormatEvent<S, N> for Tagged<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    F: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "{LOG_TAG} ")?;
        self.0.format_event(ctx, writer, event)
    }
}

fn default_directives(cog_log: Option<&str>) -> String {
    let level = match cog_log {
        Some("debug") => "debug",
        Some("warn") | Some("warning") => "warn",
        Some("error") => "error",
        _ => "info",
    };
    format!("cogless={level},cogless_predictors={level},cogless_file_runner={level}")
}
