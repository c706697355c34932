use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Mutex;

use colored::{Color, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record};
use time::macros;

const LOG_FILE: &str = "velo.log";

struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
}

impl Logger {
    fn new(filename: &str) -> Self {
        log::set_max_level(LevelFilter::Debug);
        let file = File::options().append(true).create(true).open(filename).ok();
        Self { file: file.map(|file| Mutex::new(BufWriter::new(file))) }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match metadata.target().split("::").next() {
            Some("velo") => true,
            _ => metadata.level() <= Level::Info,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let Ok(timestamp) = time::OffsetDateTime::now_utc()
            .format(macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        else {
            return;
        };
        let target = record.target();
        let level = record.level().as_str();
        let args = record.args();

        let color = match record.level() {
            Level::Error => Color::BrightRed,
            Level::Warn => Color::BrightYellow,
            Level::Info => Color::BrightCyan,
            Level::Debug => Color::Magenta,
            Level::Trace => Color::Green,
        };

        if record.level() <= Level::Info {
            println!("{} {} {args}", timestamp.color(Color::BrightBlack), level.color(color));
        }

        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            writeln!(file, "{timestamp} [{target} {level}] {args}").ok();
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            file.flush().ok();
        }
    }
}

/// Logs info and above to stdout, everything from this crate to `velo.log`.
pub fn init() {
    if log::set_boxed_logger(Box::new(Logger::new(LOG_FILE))).is_err() {
        eprintln!("a logger is already installed");
    }
}
