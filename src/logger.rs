//! Logging capability handed to each stage.

use crate::error::Result;

pub trait PipelineLogger {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
}

/// Forwards to the `tracing` macros; the subscriber is installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl PipelineLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Logs the error of a failed step at warning level and hands it back unchanged.
pub fn logged<T>(logger: &dyn PipelineLogger, result: Result<T>) -> Result<T> {
    result.map_err(|e| {
        logger.warning(&e.to_string());
        e
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::PipelineLogger;
    use std::cell::RefCell;

    /// Keeps every message so tests can assert on them.
    #[derive(Default)]
    pub struct RecordingLogger {
        pub infos: RefCell<Vec<String>>,
        pub warnings: RefCell<Vec<String>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn info(&self, message: &str) {
            self.infos.borrow_mut().push(message.to_string());
        }

        fn warning(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_string());
        }
    }
}
