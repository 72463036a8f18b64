//! File selection.
//!
//! `FilePicker` is the capability the source manager prompts when the user
//! selects video or image input. `QueuedFilePicker` answers prompts from a
//! shared queue of local paths, filled by CLI flags and commands.

use anyhow::{anyhow, Context, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Upper bound on a picked file; larger uploads are refused before reading.
pub const MAX_PICKED_FILE_BYTES: u64 = 512 * 1024 * 1024;

const VIDEO_EXTENSIONS: &[&str] = &["mjpeg", "mjpg", "mjp", "avi"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// MIME category a prompt accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaCategory {
    Video,
    Image,
}

impl MediaCategory {
    pub fn accept(&self) -> &'static str {
        match self {
            MediaCategory::Video => "video/*",
            MediaCategory::Image => "image/*",
        }
    }

    /// True when the path's extension belongs to this category.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        let allowed = match self {
            MediaCategory::Video => VIDEO_EXTENSIONS,
            MediaCategory::Image => IMAGE_EXTENSIONS,
        };
        allowed.contains(&ext.as_str())
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.accept())
    }
}

/// A chosen file, already read into memory.
#[derive(Clone, Debug)]
pub struct PickedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

pub trait FilePicker {
    /// Prompt for a single file of the given category. `Ok(None)` means cancelled.
    fn pick(&mut self, category: MediaCategory) -> Result<Option<PickedFile>>;
}

/// Picker fed from a queue of paths. Clones share the same queue.
#[derive(Clone, Debug, Default)]
pub struct QueuedFilePicker {
    queue: Rc<RefCell<VecDeque<PathBuf>>>,
}

impl QueuedFilePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next prompt.
    pub fn queue(&self, path: impl Into<PathBuf>) {
        self.queue.borrow_mut().push_back(path.into());
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}

impl FilePicker for QueuedFilePicker {
    fn pick(&mut self, category: MediaCategory) -> Result<Option<PickedFile>> {
        let Some(path) = self.queue.borrow_mut().pop_front() else {
            return Ok(None);
        };
        if !category.matches(&path) {
            return Err(anyhow!(
                "{} is not a {} file",
                path.display(),
                category.accept()
            ));
        }
        read_picked_file(&path).map(Some)
    }
}

fn read_picked_file(path: &Path) -> Result<PickedFile> {
    let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if !meta.is_file() {
        return Err(anyhow!("{} is not a regular file", path.display()));
    }
    if meta.len() > MAX_PICKED_FILE_BYTES {
        return Err(anyhow!(
            "{} exceeds the {} MiB upload limit",
            path.display(),
            MAX_PICKED_FILE_BYTES / (1024 * 1024)
        ));
    }
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(PickedFile { name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn categories_match_by_extension() {
        assert!(MediaCategory::Video.matches(Path::new("clip.MJPEG")));
        assert!(MediaCategory::Image.matches(Path::new("/tmp/pose.png")));
        assert!(!MediaCategory::Image.matches(Path::new("clip.mjpeg")));
        assert!(!MediaCategory::Video.matches(Path::new("noext")));
        assert_eq!(MediaCategory::Video.to_string(), "video/*");
    }

    #[test]
    fn empty_queue_is_a_cancelled_prompt() -> Result<()> {
        let mut picker = QueuedFilePicker::new();
        assert!(picker.pick(MediaCategory::Image)?.is_none());
        Ok(())
    }

    #[test]
    fn clones_share_the_queue() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("still.png");
        std::fs::File::create(&path)?.write_all(b"not really a png")?;

        let feeder = QueuedFilePicker::new();
        let mut picker = feeder.clone();
        feeder.queue(&path);
        assert_eq!(picker.pending(), 1);

        let file = picker.pick(MediaCategory::Image)?.expect("picked file");
        assert_eq!(file.name, "still.png");
        assert_eq!(file.bytes, b"not really a png");
        assert_eq!(feeder.pending(), 0);
        Ok(())
    }

    #[test]
    fn wrong_category_is_rejected() {
        let mut picker = QueuedFilePicker::new();
        picker.queue("clip.mjpeg");
        assert!(picker.pick(MediaCategory::Image).is_err());
    }
}
