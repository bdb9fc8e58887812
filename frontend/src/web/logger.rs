//! `log` 门面的浏览器控制台后端

use log::{Level, Log, Metadata, Record};
use wasm_bindgen::JsValue;

pub struct ConsoleLogger {
    level: Level,
}

impl ConsoleLogger {
    /// 安装为全局 logger；重复安装时忽略
    pub fn init(level: Level) {
        let logger = Box::leak(Box::new(ConsoleLogger { level }));
        if log::set_logger(logger).is_ok() {
            log::set_max_level(level.to_level_filter());
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("{} {}", record.level(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}
