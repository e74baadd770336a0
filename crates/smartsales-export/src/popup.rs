//! Print capability seam
//!
//! Print jobs need a fresh browsing context to load a document into and a way
//! to trigger printing once it is loaded. Hosts provide both through
//! [`PopupSink`]; availability is probed up front instead of failing silently.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ExportError, Result};
use crate::sinks::prepare_output_dir;

/// A loaded document that can be printed
pub trait PrintContext: Send {
    fn load(&mut self, html: &str) -> Result<()>;

    /// Trigger printing; only valid after a successful `load`
    fn print(&mut self) -> Result<()>;

    /// Where the document lives, if it has a location
    fn location(&self) -> Option<PathBuf> {
        None
    }
}

/// Opens print contexts
pub trait PopupSink: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Open a context for the document `name`
    fn open(&self, name: &str) -> Result<Box<dyn PrintContext>>;
}

/// Host without any print capability
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPopup;

impl PopupSink for NoPopup {
    fn is_supported(&self) -> bool {
        false
    }

    fn open(&self, _name: &str) -> Result<Box<dyn PrintContext>> {
        Err(ExportError::SinkUnavailable(
            "no print destination available".to_string(),
        ))
    }
}

/// Writes print documents as standalone `.html` files
///
/// Printing is left to whatever opens the file; `print` records that the
/// document is ready.
#[derive(Debug, Clone)]
pub struct FilePopup {
    dir: PathBuf,
}

impl FilePopup {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl PopupSink for FilePopup {
    fn is_supported(&self) -> bool {
        !self.dir.exists() || self.dir.is_dir()
    }

    fn open(&self, name: &str) -> Result<Box<dyn PrintContext>> {
        prepare_output_dir(&self.dir)?;
        Ok(Box::new(FilePrintContext {
            path: self.dir.join(name),
            loaded: false,
        }))
    }
}

struct FilePrintContext {
    path: PathBuf,
    loaded: bool,
}

impl PrintContext for FilePrintContext {
    fn load(&mut self, html: &str) -> Result<()> {
        fs::write(&self.path, html)?;
        self.loaded = true;
        Ok(())
    }

    fn print(&mut self) -> Result<()> {
        if !self.loaded {
            return Err(ExportError::SinkUnavailable(
                "print requested before the document was loaded".to_string(),
            ));
        }
        info!("Print-ready document written to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}
