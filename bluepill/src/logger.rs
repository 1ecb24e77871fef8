use log::{LevelFilter, Log, Metadata, Record};

use fpga_echo::report;

use crate::config;
use crate::hardware::ReportPort;

/// `log` backend writing `LEVEL | message` lines to the host serial port.
pub struct UartLogger {
    level: LevelFilter,
}

static LOGGER: UartLogger = UartLogger {
    level: config::LOG_LEVEL,
};

/// Install the logger. Later calls are ignored.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LOGGER.level);
    }
}

impl Log for UartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            report::write_line(
                &mut ReportPort,
                format_args!("{} | {}", record.level(), record.args()),
            )
            .ok();
        }
    }

    fn flush(&self) {}
}
