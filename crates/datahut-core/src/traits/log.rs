/// Destination for the SQL statements a store executes.
///
/// Any `Fn(&str)` closure is a sink:
///
/// ```
/// use datahut_core::traits::LogSink;
///
/// fn install(sink: impl LogSink + 'static) -> Box<dyn LogSink> {
///     Box::new(sink)
/// }
///
/// let sink = install(|line: &str| eprintln!("sql: {line}"));
/// sink.log_line("SELECT 1");
/// ```
pub trait LogSink {
    fn log_line(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str),
{
    fn log_line(&self, line: &str) {
        self(line)
    }
}

/// Sink that forwards lines to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_line(&self, line: &str) {
        tracing::info!(target: "datahut::sql", "{}", line);
    }
}
