/// 可开关的日志输出
///
/// 由调用方显式构造并注入到各个客户端，关闭时所有调用都是空操作

use std::fmt;
use std::sync::Arc;

/// 调试日志前缀
pub const DEBUG_TAG: &str = "DBG: ";

/// 错误日志前缀
pub const ERROR_TAG: &str = "ERR: ";

/// 日志输出目标
pub trait LogSink: Send + Sync {
    /// 写入一行已带前缀的日志
    fn write_line(&self, level: LogLevel, line: &str);
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Error,
}

impl LogLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Debug => DEBUG_TAG,
            Self::Error => ERROR_TAG,
        }
    }
}

/// 默认输出：转发到 tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_line(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => tracing::debug!("{}", line),
            LogLevel::Error => tracing::error!("{}", line),
        }
    }
}

/// 日志器
#[derive(Clone, Default)]
pub struct Logger {
    /// None 表示关闭
    sink: Option<Arc<dyn LogSink>>,
}

impl Logger {
    /// 创建日志器，enabled 为 false 时不分配任何输出目标
    pub fn new(enabled: bool) -> Self {
        if enabled {
            Self::with_sink(Arc::new(TracingSink))
        } else {
            Self::disabled()
        }
    }

    /// 使用自定义输出目标创建已开启的日志器
    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// 关闭的日志器
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// 输出调试日志
    pub fn debug(&self, msg: impl fmt::Display) {
        self.emit(LogLevel::Debug, msg);
    }

    /// 输出错误日志
    pub fn error(&self, msg: impl fmt::Display) {
        self.emit(LogLevel::Error, msg);
    }

    fn emit(&self, level: LogLevel, msg: impl fmt::Display) {
        if let Some(sink) = &self.sink {
            sink.write_line(level, &format!("{}{}", level.tag(), msg));
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// 内存输出目标，保存所有写入的行
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: std::sync::Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已写入的所有行
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, _level: LogLevel, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 收集 tracing 输出的缓冲区
    #[derive(Clone, Default)]
    struct CaptureBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl CaptureBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CaptureBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// 在作用域内安装写入缓冲区的订阅者并运行 f
    fn capture_tracing(f: impl FnOnce()) -> String {
        let buffer = CaptureBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    #[test]
    fn test_disabled_logger_is_silent() {
        let output = capture_tracing(|| {
            let logger = Logger::new(false);
            assert!(!logger.is_enabled());

            logger.debug("x");
            logger.error(42);
            logger.debug(3.5);
            logger.error(String::from("boom"));
        });

        assert!(output.is_empty(), "unexpected output: {:?}", output);
    }

    #[test]
    fn test_enabled_logger_writes_to_tracing() {
        let output = capture_tracing(|| Logger::new(true).debug("x"));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1, "output: {:?}", output);
        assert!(lines[0].contains("DBG: "));
        assert!(lines[0].contains('x'));
    }

    #[test]
    fn test_enabled_logger_error_goes_to_tracing_error() {
        let output = capture_tracing(|| Logger::new(true).error(404));

        assert!(output.contains("ERROR"));
        assert!(output.contains("ERR: 404"));
    }

    #[test]
    fn test_enabled_logger_writes_one_tagged_line() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::with_sink(sink.clone());

        logger.debug("x");

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("DBG: "));
        assert!(lines[0].contains('x'));
    }

    #[test]
    fn test_error_tag_and_non_string_input() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::with_sink(sink.clone());

        logger.error(404);
        logger.debug(true);

        assert_eq!(sink.lines(), vec!["ERR: 404".to_string(), "DBG: true".to_string()]);
    }

    #[test]
    fn test_clones_share_sink() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::with_sink(sink.clone());
        let cloned = logger.clone();

        logger.debug("a");
        cloned.debug("b");

        assert_eq!(sink.lines().len(), 2);
    }
}
