//! Derived presentation rules.
//!
//! Pure functions only. They decide status coloring, path transposition on a
//! transfer-direction swap, and human-readable byte sizes; every front end
//! renders through these so the edge cases stay consistent.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::wire::TransferDirection;

// ── Severity ─────────────────────────────────────────────────────────────────

/// Three-level status used for coloring gauges and statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Inclusive lower bounds for the two elevated severities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Thresholds {
    pub const fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// CPU and memory usage percentages.
pub const RESOURCE_THRESHOLDS: Thresholds = Thresholds::new(70.0, 90.0);

/// Per-mount disk usage percentages.
pub const DISK_THRESHOLDS: Thresholds = Thresholds::new(80.0, 95.0);

/// Single-process CPU percentage.
pub const PROCESS_CPU_THRESHOLDS: Thresholds = Thresholds::new(50.0, 80.0);

/// Single-process memory percentage.
pub const PROCESS_MEMORY_THRESHOLDS: Thresholds = Thresholds::new(10.0, 20.0);

/// Classify `value`. A value equal to a threshold takes the higher severity.
pub fn status_severity(value: f64, thresholds: Thresholds) -> Severity {
    if value >= thresholds.critical {
        Severity::Critical
    } else if value >= thresholds.warning {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

// ── Transfer direction ───────────────────────────────────────────────────────

/// Flip the direction and exchange the paths, unconditionally.
///
/// Applying this twice yields the original triple, empty paths included.
pub fn swap_direction(
    direction: TransferDirection,
    source_path: String,
    dest_path: String,
) -> (TransferDirection, String, String) {
    (direction.reversed(), dest_path, source_path)
}

// ── Byte sizes ───────────────────────────────────────────────────────────────

const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Render a byte count with the largest 1024-based unit whose quotient is at
/// least one, rounded to two decimals with trailing zeros dropped.
///
/// `0` renders as `"0 Bytes"`; counts beyond the last unit stay in TB.
pub fn byte_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", BYTE_UNITS[0]);
    }

    let mut unit = 0;
    let mut divisor: u64 = 1;
    while unit + 1 < BYTE_UNITS.len() {
        match divisor.checked_mul(1024) {
            Some(next) if bytes >= next => {
                divisor = next;
                unit += 1;
            }
            _ => break,
        }
    }

    let quotient = bytes as f64 / divisor as f64;
    let rounded = (quotient * 100.0).round() / 100.0;
    format!("{} {}", rounded, BYTE_UNITS[unit])
}

/// Last path segment, used as the display name of a listed or transferred
/// file. Empty for paths ending in `/`.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

// ── File listing ─────────────────────────────────────────────────────────────

/// Coarse kind of a listed path, derived from its spelling alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Directory,
    Text,
    Pdf,
    Image,
    Audio,
    Video,
    Other,
}

impl FileCategory {
    pub fn from_path(path: &str) -> Self {
        if path.ends_with('/') {
            return FileCategory::Directory;
        }
        let ext = path.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
        match ext.as_str() {
            "txt" => FileCategory::Text,
            "pdf" => FileCategory::Pdf,
            "jpg" | "jpeg" | "png" => FileCategory::Image,
            "mp3" | "wav" => FileCategory::Audio,
            "mp4" | "avi" => FileCategory::Video,
            _ => FileCategory::Other,
        }
    }
}

/// Set of selected paths on one device; selecting a selected path clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    paths: BTreeSet<String>,
}

impl FileSelection {
    /// Toggle `path`. Returns `true` if it is selected afterwards.
    pub fn toggle(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.paths.remove(&path) {
            false
        } else {
            self.paths.insert(path);
            true
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── status_severity ─────────────────────────────
    #[test]
    fn test_resource_threshold_boundaries() {
        let t = RESOURCE_THRESHOLDS;
        assert_eq!(status_severity(69.999, t), Severity::Normal);
        assert_eq!(status_severity(70.0, t), Severity::Warning);
        assert_eq!(status_severity(89.999, t), Severity::Warning);
        assert_eq!(status_severity(90.0, t), Severity::Critical);
        assert_eq!(status_severity(100.0, t), Severity::Critical);
    }

    #[test]
    fn test_disk_threshold_boundaries() {
        assert_eq!(status_severity(79.9, DISK_THRESHOLDS), Severity::Normal);
        assert_eq!(status_severity(80.0, DISK_THRESHOLDS), Severity::Warning);
        assert_eq!(status_severity(95.0, DISK_THRESHOLDS), Severity::Critical);
    }

    // ── swap_direction ──────────────────────────────
    #[test]
    fn test_swap_exchanges_paths_and_flips_direction() {
        let (d, s, t) = swap_direction(
            TransferDirection::Device1ToDevice2,
            "/a/f.txt".into(),
            "/b/f.txt".into(),
        );
        assert_eq!(d, TransferDirection::Device2ToDevice1);
        assert_eq!(s, "/b/f.txt");
        assert_eq!(t, "/a/f.txt");
    }

    #[test]
    fn test_swap_is_an_involution() {
        let cases = [
            ("/a/f.txt", "/b/f.txt"),
            ("", "/b/f.txt"),
            ("/a/f.txt", ""),
            ("", ""),
            ("same", "same"),
        ];
        for dir in [
            TransferDirection::Device1ToDevice2,
            TransferDirection::Device2ToDevice1,
        ] {
            for (src, dst) in cases {
                let (d1, s1, t1) = swap_direction(dir, src.to_string(), dst.to_string());
                let (d2, s2, t2) = swap_direction(d1, s1, t1);
                assert_eq!((d2, s2.as_str(), t2.as_str()), (dir, src, dst));
            }
        }
    }

    // ── byte_size ───────────────────────────────────
    #[test]
    fn test_byte_size_examples() {
        assert_eq!(byte_size(0), "0 Bytes");
        assert_eq!(byte_size(1), "1 Bytes");
        assert_eq!(byte_size(1023), "1023 Bytes");
        assert_eq!(byte_size(1024), "1 KB");
        assert_eq!(byte_size(1536), "1.5 KB");
        assert_eq!(byte_size(2048), "2 KB");
        assert_eq!(byte_size(1_073_741_824), "1 GB");
    }

    #[test]
    fn test_byte_size_rounds_to_two_decimals() {
        // 1234567 / 1024^2 = 1.1773...
        assert_eq!(byte_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn test_byte_size_caps_at_terabytes() {
        let two_pb = 2 * 1024u64.pow(5);
        assert_eq!(byte_size(two_pb), "2048 TB");
        assert!(byte_size(u64::MAX).ends_with(" TB"));
    }

    // ── file helpers ────────────────────────────────
    #[test]
    fn test_file_category_from_path() {
        assert_eq!(FileCategory::from_path("/home/u/"), FileCategory::Directory);
        assert_eq!(FileCategory::from_path("/a/notes.TXT"), FileCategory::Text);
        assert_eq!(FileCategory::from_path("/a/b.pdf"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_path("/a/b.jpeg"), FileCategory::Image);
        assert_eq!(FileCategory::from_path("/a/b.wav"), FileCategory::Audio);
        assert_eq!(FileCategory::from_path("/a/b.avi"), FileCategory::Video);
        assert_eq!(FileCategory::from_path("/a/b.tar.gz"), FileCategory::Other);
        assert_eq!(FileCategory::from_path("/usr/bin/ls"), FileCategory::Other);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/a/b/f.txt"), "f.txt");
        assert_eq!(file_name("f.txt"), "f.txt");
        assert_eq!(file_name("/a/b/"), "");
    }

    #[test]
    fn test_file_selection_toggles() {
        let mut sel = FileSelection::default();
        assert!(sel.toggle("/a"));
        assert!(sel.contains("/a"));
        assert!(!sel.toggle("/a"));
        assert!(sel.is_empty());
    }
}
