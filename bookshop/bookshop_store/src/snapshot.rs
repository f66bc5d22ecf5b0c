//! Shutdown reports.
//!
//! State objects expose a serializable view of themselves that can be written
//! to disk once the workers have stopped.

use bookshop_core::Result;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// State that can be exported as a report
pub trait Snapshot {
    /// Serializable view of the current state
    type Output: Serialize;

    /// Capture the current state
    fn snapshot(&self) -> Self::Output;

    /// Write the current state to `path` as pretty-printed JSON
    fn write_snapshot(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.snapshot())?;
        writer.flush()?;
        info!("Wrote snapshot to {}", path.display());
        Ok(())
    }
}
