//! Каналы диагностики: предупреждения, ошибки и трасса областей видимости.
//!
//! Каждый канал буферизует строки и, если задан, дублирует их во внешний
//! [`Sink`]. Куда именно пишет sink решает вызывающий.

/// Приёмник строк диагностики.
pub trait Sink {
    /// Записать одну строку.
    fn write_line(&mut self, line: &str);
}

impl<F: FnMut(&str)> Sink for F {
    fn write_line(&mut self, line: &str) {
        self(line)
    }
}

/// Sink, пересылающий строки в крейт `log`.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    level: log::Level,
    target: &'static str,
}

impl LogSink {
    pub fn new(level: log::Level, target: &'static str) -> Self {
        Self { level, target }
    }
}

impl Sink for LogSink {
    fn write_line(&mut self, line: &str) {
        log::log!(target: self.target, self.level, "{}", line);
    }
}

/// Один канал: буфер строк и необязательный внешний приёмник.
#[derive(Default)]
struct Channel {
    lines: Vec<String>,
    sink: Option<Box<dyn Sink>>,
}

impl Channel {
    fn write(&mut self, line: String) {
        if let Some(sink) = self.sink.as_mut() {
            sink.write_line(&line);
        }
        self.lines.push(line);
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("lines", &self.lines)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Три независимых канала диагностики одной единицы компиляции.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Channel,
    errors: Channel,
    scopes: Channel,
}

impl Diagnostics {
    /// Только буферы, без внешних приёмников.
    pub fn new() -> Self {
        Self::default()
    }

    /// Буферы плюс пересылка в `log`: warn, error и debug соответственно.
    pub fn logging() -> Self {
        Self::new()
            .with_warning_sink(LogSink::new(log::Level::Warn, "tacc::warnings"))
            .with_error_sink(LogSink::new(log::Level::Error, "tacc::errors"))
            .with_scope_sink(LogSink::new(log::Level::Debug, "tacc::scopes"))
    }

    pub fn with_warning_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.warnings.sink = Some(Box::new(sink));
        self
    }

    pub fn with_error_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.errors.sink = Some(Box::new(sink));
        self
    }

    pub fn with_scope_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.scopes.sink = Some(Box::new(sink));
        self
    }

    /// Записать нефатальное предупреждение.
    pub fn warn(&mut self, line: impl Into<String>) {
        self.warnings.write(line.into());
    }

    /// Записать фатальную ошибку.
    pub fn error(&mut self, line: impl Into<String>) {
        self.errors.write(line.into());
    }

    /// Записать строку трассы областей видимости.
    pub fn scope(&mut self, line: impl Into<String>) {
        self.scopes.write(line.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings.lines
    }

    pub fn errors(&self) -> &[String] {
        &self.errors.lines
    }

    pub fn scope_trace(&self) -> &[String] {
        &self.scopes.lines
    }

    /// Есть ли записанные ошибки.
    pub fn has_errors(&self) -> bool {
        !self.errors.lines.is_empty()
    }
}
