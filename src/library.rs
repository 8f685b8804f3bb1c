//! Media library enumeration

use crate::domain::{
    sort_items, Folder, FolderId, Locator, MediaId, MediaItem, MediaKind, SortKey,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Folder id used for media sitting directly in the library root
pub const ROOT_FOLDER_ID: &str = ".";

/// Source of media items and folders.
///
/// Query failures are not errors to the caller: an index that cannot read
/// its storage returns whatever it managed to read, possibly nothing.
pub trait MediaIndex: Send + Sync {
    /// Items in `folder`, or in every folder when `None`
    fn list_items(&self, folder: Option<&FolderId>) -> Vec<MediaItem>;

    fn list_folders(&self) -> Vec<Folder>;
}

/// A media index over a directory tree.
///
/// The root and each of its immediate sub-directories are folders. Ids are
/// handed out per path and stay stable for the life of the index.
#[derive(Debug)]
pub struct FsMediaIndex {
    root: PathBuf,
    show_hidden: bool,
    ids: Mutex<HashMap<PathBuf, MediaId>>,
}

impl FsMediaIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            show_hidden: false,
            ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn id_for(&self, path: &Path) -> MediaId {
        let mut ids = self.ids.lock().unwrap_or_else(|p| p.into_inner());
        let next = MediaId(ids.len() as u64 + 1);
        *ids.entry(path.to_path_buf()).or_insert(next)
    }

    fn is_hidden(&self, path: &Path) -> bool {
        !self.show_hidden
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
    }

    fn folder_dir(&self, id: &FolderId) -> PathBuf {
        if id.0 == ROOT_FOLDER_ID {
            self.root.clone()
        } else {
            self.root.join(&id.0)
        }
    }

    /// Root first, then sub-directories
    fn folder_dirs(&self) -> io::Result<Vec<(FolderId, PathBuf)>> {
        let mut dirs = vec![(FolderId(ROOT_FOLDER_ID.to_string()), self.root.clone())];

        for entry in fs::read_dir(&self.root)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path();
            if self.is_hidden(&path) || !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            dirs.push((FolderId(name), path));
        }

        Ok(dirs)
    }

    fn item_from_path(&self, path: &Path) -> io::Result<Option<MediaItem>> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let kind = MediaKind::from_extension(extension);
        if !kind.is_media() {
            return Ok(None);
        }

        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Ok(None);
        }
        let added_at: DateTime<Utc> = metadata.modified()?.into();

        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Some(MediaItem {
            id: self.id_for(path),
            locator: Locator::new(path),
            added_at,
            is_video: kind == MediaKind::Video,
            duration_ms: 0,
            size_bytes: metadata.len(),
            display_name,
        }))
    }

    /// Media files directly inside `dir`; unreadable entries are skipped
    fn scan_dir(&self, dir: &Path) -> io::Result<Vec<MediaItem>> {
        let mut items = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = entry.path();
            if self.is_hidden(&path) {
                continue;
            }
            match self.item_from_path(&path) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }

        Ok(items)
    }
}

impl MediaIndex for FsMediaIndex {
    fn list_items(&self, folder: Option<&FolderId>) -> Vec<MediaItem> {
        let dirs = match folder {
            Some(id) => vec![self.folder_dir(id)],
            None => match self.folder_dirs() {
                Ok(dirs) => dirs.into_iter().map(|(_, path)| path).collect(),
                Err(e) => {
                    warn!(root = %self.root.display(), error = %e, "Media query failed");
                    return Vec::new();
                }
            },
        };

        let mut items = Vec::new();
        for dir in dirs {
            match self.scan_dir(&dir) {
                Ok(found) => items.extend(found),
                Err(e) => warn!(dir = %dir.display(), error = %e, "Media query failed"),
            }
        }

        sort_items(&mut items, SortKey::DateDesc);
        debug!(count = items.len(), "Listed media items");
        items
    }

    fn list_folders(&self) -> Vec<Folder> {
        let dirs = match self.folder_dirs() {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "Folder query failed");
                return Vec::new();
            }
        };

        let mut folders: Vec<Folder> = dirs
            .into_iter()
            .filter_map(|(id, path)| {
                let count = self.scan_dir(&path).map(|items| items.len()).unwrap_or(0);
                if count == 0 {
                    return None;
                }
                let name = if id.0 == ROOT_FOLDER_ID {
                    self.root
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or(ROOT_FOLDER_ID)
                        .to_string()
                } else {
                    id.0.clone()
                };
                Some(Folder { id, name, count })
            })
            .collect();

        folders.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        folders
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// In-memory index whose contents tests can swap between reloads
    #[derive(Default)]
    pub struct StaticIndex {
        pub items: Mutex<Vec<MediaItem>>,
        pub queries: Mutex<usize>,
    }

    impl StaticIndex {
        pub fn with_items(items: Vec<MediaItem>) -> Self {
            Self {
                items: Mutex::new(items),
                queries: Mutex::new(0),
            }
        }

        pub fn set_items(&self, items: Vec<MediaItem>) {
            *self.items.lock().unwrap() = items;
        }

        pub fn query_count(&self) -> usize {
            *self.queries.lock().unwrap()
        }
    }

    impl MediaIndex for StaticIndex {
        fn list_items(&self, _folder: Option<&FolderId>) -> Vec<MediaItem> {
            *self.queries.lock().unwrap() += 1;
            self.items.lock().unwrap().clone()
        }

        fn list_folders(&self) -> Vec<Folder> {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn names(items: &[MediaItem]) -> Vec<&str> {
        items.iter().map(|i| i.display_name.as_str()).collect()
    }

    #[test]
    fn test_lists_only_media_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("beach.jpg"), b"jpeg").unwrap();
        fs::write(dir.join("clip.mp4"), b"mp4").unwrap();
        fs::write(dir.join("notes.txt"), b"text").unwrap();
        fs::write(dir.join(".hidden.png"), b"png").unwrap();

        let index = FsMediaIndex::new(dir);
        let items = index.list_items(None);

        assert_eq!(items.len(), 2);
        let names = names(&items);
        assert!(names.contains(&"beach.jpg"));
        assert!(names.contains(&"clip.mp4"));

        let clip = items.iter().find(|i| i.display_name == "clip.mp4").unwrap();
        assert!(clip.is_video);
        assert_eq!(clip.size_bytes, 3);
    }

    #[test]
    fn test_ids_are_stable_across_refreshes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.jpg"), b"a").unwrap();
        fs::write(temp_dir.path().join("b.jpg"), b"b").unwrap();

        let index = FsMediaIndex::new(temp_dir.path());
        let mut first: Vec<_> = index.list_items(None).into_iter().map(|i| i.id).collect();
        fs::write(temp_dir.path().join("c.jpg"), b"c").unwrap();
        let second = index.list_items(None);

        first.sort();
        let mut again: Vec<_> = second
            .iter()
            .filter(|i| i.display_name != "c.jpg")
            .map(|i| i.id)
            .collect();
        again.sort();
        assert_eq!(first, again);
    }

    #[test]
    fn test_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("old.jpg"), b"1").unwrap();
        thread::sleep(Duration::from_millis(20));
        fs::write(temp_dir.path().join("new.jpg"), b"2").unwrap();

        let items = FsMediaIndex::new(temp_dir.path()).list_items(None);
        assert_eq!(names(&items), vec!["new.jpg", "old.jpg"]);
    }

    #[test]
    fn test_folders_and_folder_filter() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("root.jpg"), b"r").unwrap();
        fs::create_dir(root.join("Camera")).unwrap();
        fs::write(root.join("Camera").join("one.jpg"), b"1").unwrap();
        fs::write(root.join("Camera").join("two.mov"), b"2").unwrap();
        fs::create_dir(root.join("Empty")).unwrap();
        fs::create_dir(root.join(".thumbnails")).unwrap();
        fs::write(root.join(".thumbnails").join("t.jpg"), b"t").unwrap();

        let index = FsMediaIndex::new(root);
        let folders = index.list_folders();

        let camera = folders.iter().find(|f| f.name == "Camera").unwrap();
        assert_eq!(camera.count, 2);
        assert!(!folders.iter().any(|f| f.name == "Empty"));
        assert!(!folders.iter().any(|f| f.name == ".thumbnails"));

        let in_camera = index.list_items(Some(&camera.id));
        assert_eq!(in_camera.len(), 2);
        assert_eq!(index.list_items(None).len(), 3);
    }

    #[test]
    fn test_missing_root_degrades_to_empty() {
        let index = FsMediaIndex::new("/nonexistent/mswp/library");
        assert!(index.list_items(None).is_empty());
        assert!(index.list_folders().is_empty());
        assert!(index
            .list_items(Some(&FolderId("Camera".to_string())))
            .is_empty());
    }
}
