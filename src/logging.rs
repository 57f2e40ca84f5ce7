//! Logger set-up: `env_logger` to stderr, copied into a log file.

use std::{
    fs::File,
    io::{self, Write},
    sync::Once,
};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Writes everything to stderr and, if present, to a file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            // losing the file copy must not break logging to stderr
            if file.write_all(buf).is_err() {
                self.file = None;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Initializes the global logger once. Later calls are ignored.
///
/// The filter comes from the config, else from `RUST_LOG`, else `info`.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        let mut file_error = None;
        let file = config.file.as_ref().and_then(|path| match File::create(path) {
            Ok(file) => Some(file),
            Err(e) => {
                file_error = Some(format!("cannot open log file {}: {e}", path.display()));
                None
            }
        });
        let to_file = file.is_some();
        builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
        if to_file {
            builder.write_style(env_logger::WriteStyle::Never);
        }

        if let Err(e) = builder.try_init() {
            eprintln!("Warning: Could not initialize logger: {e}");
            return;
        }
        if let Some(error) = file_error {
            log::warn!("{error}");
        }
        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_copies_into_the_file() {
        let path = std::env::temp_dir().join(format!("scene-ngin-tee-{}.log", std::process::id()));
        let mut tee = Tee {
            file: Some(File::create(&path).unwrap()),
        };
        tee.write_all(b"hello\n").unwrap();
        tee.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        std::fs::remove_file(path).unwrap();
    }
}
