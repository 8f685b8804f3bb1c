//! Core data model shared by the gesture, swipe, triage and deletion layers

pub mod deletion;
pub mod gesture;
pub mod swipe;
pub mod triage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Stable identity of a media object, assigned by the media index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaId(pub u64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to a media object, resolvable by a storage authority
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(PathBuf);

impl Locator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "heic" | "heif" | "tif" | "tiff"
            | "avif" | "dng" => MediaKind::Image,

            "mp4" | "mov" | "m4v" | "mkv" | "webm" | "avi" | "3gp" | "wmv" => MediaKind::Video,

            _ => MediaKind::Other,
        }
    }

    pub fn is_media(self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

/// An immutable snapshot of one media object.
///
/// Two items with the same `id` are the same media object even when other
/// fields differ between library refreshes, so equality only compares ids.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub id: MediaId,
    pub locator: Locator,
    pub added_at: DateTime<Utc>,
    pub is_video: bool,
    pub duration_ms: u64,
    pub size_bytes: u64,
    pub display_name: String,
}

impl PartialEq for MediaItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MediaItem {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderId(pub String);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A media folder. `count` is recomputed on every library refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub count: usize,
}

/// Order applied to the active list on load and on sort changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Newest first
    #[default]
    DateDesc,
    /// Oldest first
    DateAsc,
    /// Largest first
    SizeDesc,
    /// Smallest first
    SizeAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::DateDesc,
        SortKey::DateAsc,
        SortKey::SizeDesc,
        SortKey::SizeAsc,
    ];

    /// The key after this one, wrapping around
    pub fn next(self) -> Self {
        match self {
            SortKey::DateDesc => SortKey::DateAsc,
            SortKey::DateAsc => SortKey::SizeDesc,
            SortKey::SizeDesc => SortKey::SizeAsc,
            SortKey::SizeAsc => SortKey::DateDesc,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::DateDesc => "Newest first",
            SortKey::DateAsc => "Oldest first",
            SortKey::SizeDesc => "Largest first",
            SortKey::SizeAsc => "Smallest first",
        }
    }
}

/// Sorts items in place. The sort is stable, so ties keep their prior order.
pub fn sort_items(items: &mut [MediaItem], key: SortKey) {
    match key {
        SortKey::DateDesc => items.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
        SortKey::DateAsc => items.sort_by(|a, b| a.added_at.cmp(&b.added_at)),
        SortKey::SizeDesc => items.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes)),
        SortKey::SizeAsc => items.sort_by(|a, b| a.size_bytes.cmp(&b.size_bytes)),
    }
}

/// A vector that is guaranteed to hold at least one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmpty<T>(Vec<T>);

impl<T> NonEmpty<T> {
    pub fn from_vec(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self(items))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present so clippy does not complain about `len` alone
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<'a, T> IntoIterator for &'a NonEmpty<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Formats a byte count as megabytes with two decimals, e.g. `"5.00 MB"`
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB)
}

/// Short size label used on cards, e.g. `"2.4 MB"`
pub fn format_size_short(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / BYTES_PER_MB)
}

/// Formats a duration as `m:ss`, or `h:mm:ss` past an hour
pub fn format_duration(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Builds an item whose `added_at` grows with its id
    pub fn item(id: u64, size_bytes: u64) -> MediaItem {
        MediaItem {
            id: MediaId(id),
            locator: Locator::new(format!("/media/p{}.jpg", id)),
            added_at: Utc.timestamp_opt(1_700_000_000 + id as i64 * 60, 0).unwrap(),
            is_video: false,
            duration_ms: 0,
            size_bytes,
            display_name: format!("p{}.jpg", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::item;
    use super::*;

    mod media_kind_tests {
        use super::*;

        #[test]
        fn test_media_kind_images() {
            assert_eq!(MediaKind::from_extension("jpg"), MediaKind::Image);
            assert_eq!(MediaKind::from_extension("HEIC"), MediaKind::Image);
            assert_eq!(MediaKind::from_extension("png"), MediaKind::Image);
        }

        #[test]
        fn test_media_kind_videos() {
            assert_eq!(MediaKind::from_extension("mp4"), MediaKind::Video);
            assert_eq!(MediaKind::from_extension("MOV"), MediaKind::Video);
        }

        #[test]
        fn test_media_kind_other() {
            assert_eq!(MediaKind::from_extension("txt"), MediaKind::Other);
            assert_eq!(MediaKind::from_extension(""), MediaKind::Other);
            assert!(!MediaKind::Other.is_media());
        }
    }

    mod media_item_tests {
        use super::*;

        #[test]
        fn test_identity_is_id_only() {
            let a = item(7, 100);
            let mut b = item(7, 999);
            b.display_name = "renamed.jpg".to_string();
            assert_eq!(a, b);
            assert_ne!(a, item(8, 100));
        }
    }

    mod sort_tests {
        use super::*;

        fn ids(items: &[MediaItem]) -> Vec<u64> {
            items.iter().map(|i| i.id.0).collect()
        }

        #[test]
        fn test_sort_by_date() {
            let mut items = vec![item(2, 10), item(1, 30), item(3, 20)];
            sort_items(&mut items, SortKey::DateDesc);
            assert_eq!(ids(&items), vec![3, 2, 1]);
            sort_items(&mut items, SortKey::DateAsc);
            assert_eq!(ids(&items), vec![1, 2, 3]);
        }

        #[test]
        fn test_sort_by_size() {
            let mut items = vec![item(1, 30), item(2, 10), item(3, 20)];
            sort_items(&mut items, SortKey::SizeDesc);
            assert_eq!(ids(&items), vec![1, 3, 2]);
            sort_items(&mut items, SortKey::SizeAsc);
            assert_eq!(ids(&items), vec![2, 3, 1]);
        }

        #[test]
        fn test_sort_is_stable_on_ties() {
            let mut items = vec![item(1, 5), item(2, 5), item(3, 5)];
            sort_items(&mut items, SortKey::SizeDesc);
            assert_eq!(ids(&items), vec![1, 2, 3]);
        }

        #[test]
        fn test_sort_key_cycles() {
            let mut key = SortKey::default();
            for _ in 0..SortKey::ALL.len() {
                key = key.next();
            }
            assert_eq!(key, SortKey::DateDesc);
        }
    }

    mod non_empty_tests {
        use super::*;

        #[test]
        fn test_non_empty_rejects_empty() {
            assert!(NonEmpty::<u8>::from_vec(vec![]).is_none());
        }

        #[test]
        fn test_non_empty_keeps_order() {
            let batch = NonEmpty::from_vec(vec![1, 2, 3]).unwrap();
            assert_eq!(batch.len(), 3);
            assert_eq!(batch.iter().next(), Some(&1));
            assert_eq!(batch.into_vec(), vec![1, 2, 3]);
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn test_format_megabytes() {
            assert_eq!(format_megabytes(5 * 1024 * 1024), "5.00 MB");
            assert_eq!(format_megabytes(0), "0.00 MB");
            assert_eq!(format_megabytes(1536 * 1024), "1.50 MB");
        }

        #[test]
        fn test_format_size_short() {
            assert_eq!(format_size_short(2_516_582), "2.4 MB");
        }

        #[test]
        fn test_format_duration() {
            assert_eq!(format_duration(0), "0:00");
            assert_eq!(format_duration(65_000), "1:05");
            assert_eq!(format_duration(3_725_000), "1:02:05");
        }
    }
}
