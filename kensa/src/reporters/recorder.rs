use std::{
    cell::RefCell,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{Reporter, report::SpecReport};

/// A reporter that records every finished spec to a file in JSON Lines format.
///
/// Each [`SpecReport`] is written as a JSON object on its own line, flushed
/// immediately, so a run that is killed halfway still leaves a readable file.
///
/// # Example
///
/// ```ignore
/// let recorder = Recorder::new("specs.jsonl")?;
/// runner.add_reporter(recorder);
/// ```
#[derive(Debug)]
pub struct Recorder {
    writer: RefCell<BufWriter<File>>,
}

impl Recorder {
    /// Create a recorder that writes to `path`, truncating it.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the file cannot be created.
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: RefCell::new(BufWriter::new(file)),
        })
    }
}

impl Reporter for Recorder {
    fn on_spec_done(&self, report: &SpecReport) {
        if let Ok(mut writer) = self.writer.try_borrow_mut() {
            if let Err(e) = serde_json::to_writer(&mut *writer, report) {
                tracing::warn!("Recorder failed to serialize spec report: {}", e);
            }
            let _ = writer.write_all(b"\n");
            let _ = writer.flush();
        } else {
            tracing::warn!("Recorder failed to borrow writer");
        }
    }
}
