//! Log sink registry / 日志输出注册表
//!
//! Each component logs under its own logger name (the tracing target). The
//! first time a name is attached a stderr sink is installed; attaching the
//! same name again is a no-op, so building many clients never duplicates
//! output lines.

use std::collections::HashSet;
use std::fmt;

use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Attached logger names / 已挂载的日志名称
static ATTACHED: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// `timestamp - logger_name - LEVEL - message` line format / 日志行格式
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "{} - {} - {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Whether `target` belongs to an attached logger / 目标是否属于已挂载的日志
pub fn is_attached(target: &str) -> bool {
    let attached = ATTACHED.lock();
    attached.iter().any(|name| belongs_to(target, name))
}

fn belongs_to(target: &str, name: &str) -> bool {
    target == name
        || target
            .strip_prefix(name)
            .map_or(false, |rest| rest.starts_with("::"))
}

/// Attach the sink for `name` once per process / 为日志名称挂载输出（每进程一次）
///
/// Returns `true` when this call registered the name. The global subscriber is
/// installed by the first registration only; if the host application already
/// installed one, events keep flowing to the host's subscriber instead.
pub fn attach_sink(name: &str) -> bool {
    let (registered, first) = {
        let mut attached = ATTACHED.lock();
        let first = attached.is_empty();
        (attached.insert(name.to_string()), first)
    };

    if registered && first {
        let layer = tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_writer(std::io::stderr)
            .with_filter(filter_fn(|meta| is_attached(meta.target())));

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global subscriber already installed, keeping the host's sink for {}", name);
        }
    }

    registered
}

/// Capturing writer for asserting emitted lines / 测试用日志捕获
#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tracing::Subscriber;
    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::layer::SubscriberExt;

    use super::LineFormat;

    #[derive(Clone, Default)]
    pub(crate) struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        /// Subscriber formatting every event into this buffer / 写入本缓冲区的订阅者
        pub(crate) fn subscriber(&self) -> impl Subscriber + Send + Sync {
            tracing_subscriber::registry().with(
                tracing_subscriber::fmt::layer()
                    .event_format(LineFormat)
                    .with_writer(self.clone()),
            )
        }

        pub(crate) fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::capture::Buffer;
    use super::*;

    #[test]
    fn test_attach_sink_is_idempotent() {
        assert!(attach_sink("gcs_storage_client::tests::idempotent"));
        assert!(!attach_sink("gcs_storage_client::tests::idempotent"));
        assert!(is_attached("gcs_storage_client::tests::idempotent"));
        assert!(is_attached("gcs_storage_client::tests::idempotent::child"));
        assert!(!is_attached("gcs_storage_client::tests::idempotent_other"));
    }

    #[test]
    fn test_attach_sink_distinct_names() {
        assert!(attach_sink("gcs_storage_client::tests::first"));
        assert!(attach_sink("gcs_storage_client::tests::second"));
        assert!(!attach_sink("gcs_storage_client::tests::first"));
    }

    #[test]
    fn test_line_format() {
        let buffer = Buffer::default();
        tracing::subscriber::with_default(buffer.subscriber(), || {
            tracing::warn!(target: "gcs_storage_client::client", "File 'a' not found");
        });

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        let parts: Vec<&str> = lines[0].splitn(4, " - ").collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].len(), "2026-01-01 00:00:00,000".len());
        assert_eq!(parts[1], "gcs_storage_client::client");
        assert_eq!(parts[2], "WARN");
        assert_eq!(parts[3], "File 'a' not found");
    }
}
