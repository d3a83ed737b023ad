pub mod apply;
pub mod inspect;
pub mod migrate;
pub mod popups;
pub mod preview;
pub mod validate;

pub use apply::{apply, ApplyArgs};
pub use inspect::{inspect, InspectArgs};
pub use migrate::{migrate, MigrateArgs};
pub use popups::{popups, PopupsArgs};
pub use preview::{preview, PreviewArgs};
pub use validate::{validate, ValidateArgs};

use crate::config::Config;
use anyhow::{Context as _, Result};
use funnel_common::DirectoryStore;
use funnel_editor::{DocumentStore, Tree};
use std::path::{Path, PathBuf};

/// Working directory plus its loaded config
pub struct Context {
    pub cwd: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load(cwd: PathBuf) -> Result<Self> {
        let config = Config::load(&cwd)?;
        Ok(Self { cwd, config })
    }

    pub fn open_store(&self) -> Result<DirectoryStore> {
        let dir = self.config.get_storage_dir(&self.cwd);
        DirectoryStore::open(&dir).with_context(|| format!("Cannot open storage at {}", dir.display()))
    }

    pub fn document_store(&self) -> Result<DocumentStore<DirectoryStore>> {
        Ok(DocumentStore::new(self.open_store()?, self.config.document_key.clone()))
    }

    /// Tree from `input`, or the persisted document when no file is given
    pub fn load_tree(&self, input: Option<&Path>) -> Result<Tree> {
        match input {
            Some(path) => read_tree(path),
            None => self.document_store()?.load().ok_or_else(|| {
                anyhow::anyhow!(
                    "No document given and nothing stored under {}",
                    self.config.document_key
                )
            }),
        }
    }
}

pub fn read_tree(path: &Path) -> Result<Tree> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    funnel_editor::import_str(&source).with_context(|| format!("Cannot load {}", path.display()))
}

/// Write to `output`, or stdout when none is given
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Cannot write {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
