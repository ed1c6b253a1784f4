//! Interfaces of the collaborators that live outside this crate: the
//! image writer and the native secret-file picker.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::userdata::SecretFileEntry;

/// What the flasher needs from a finalized wizard run: the rendered
/// user-data text and the secret files to copy next to it.
#[derive(Debug, Clone)]
pub struct RenderedConfig {
    pub combined_text: String,
    pub secret_files: Vec<SecretFileEntry>,
}

/// The image-writing pipeline. Implemented by the GUI shell; invoked with
/// an image path, the target drives, and the finished configuration.
pub trait Flasher {
    fn flash(&mut self, image_path: &Path, drives: &[String], config: &RenderedConfig)
    -> Result<()>;
}

/// Native file dialog for picking SSH key files. `Ok(None)` means the
/// user cancelled, which is not an error.
pub trait SecretFilePicker {
    fn select_secret_file(&mut self) -> Result<Option<PathBuf>>;
}
