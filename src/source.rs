//! Image source: the folder scan that groups crop files by instrument, and
//! decoding of those files into grayscale rasters.

use anyhow::Context;
use image::{GrayImage, ImageReader};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::field::{image_key, Field, SourceVariant};

const EXTS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// A crop as handed to the evaluator.
#[derive(Debug, Clone)]
pub enum LoadedImage {
    Ready(GrayImage),
    /// The file exists but could not be decoded.
    Unreadable(String),
}

/// All crops of one group, keyed `{field}_{source}`.
#[derive(Debug, Clone, Default)]
pub struct GroupImages {
    pub id: String,
    pub images: BTreeMap<String, LoadedImage>,
}

impl GroupImages {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            images: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, field: Field, source: SourceVariant, image: LoadedImage) {
        self.images.insert(image_key(field, source), image);
    }
}

/// Group id → image key → file path.
pub type GroupPaths = BTreeMap<String, BTreeMap<String, PathBuf>>;

/// Classify a file name as `(field, source)`.
///
/// The lowercased name must start with `angle`, `temp` or `depth` and contain
/// `_sr`, `_v7` or `_v8` (checked in that order).
pub fn detect_field_and_source(file_name: &str) -> Option<(Field, SourceVariant)> {
    let s = file_name.to_lowercase();
    let field = if s.starts_with("angle") {
        Field::Angle
    } else if s.starts_with("temp") {
        Field::Temperature
    } else if s.starts_with("depth") {
        Field::Depth
    } else {
        return None;
    };
    let source = if s.contains("_sr") {
        SourceVariant::Sr
    } else if s.contains("_v7") {
        SourceVariant::V7
    } else if s.contains("_v8") {
        SourceVariant::V8
    } else {
        return None;
    };
    Some((field, source))
}

fn has_image_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Walk `folder` recursively. Every recognised crop is keyed into the group
/// named after its parent directory; when two files map to the same key the
/// one visited last (in sorted order) wins.
pub fn scan_groups(folder: &Path) -> anyhow::Result<GroupPaths> {
    let mut groups = GroupPaths::new();
    walk(folder, &mut groups)?;
    Ok(groups)
}

fn walk(dir: &Path, groups: &mut GroupPaths) -> anyhow::Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("cannot list {}", dir.display()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .with_context(|| format!("cannot list {}", dir.display()))?;
    entries.sort();

    let gid = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for path in entries {
        if path.is_dir() {
            walk(&path, groups)?;
            continue;
        }
        if !has_image_ext(&path) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((field, source)) = detect_field_and_source(name) {
            groups
                .entry(gid.clone())
                .or_default()
                .insert(image_key(field, source), path);
        }
    }
    Ok(())
}

/// Decode one crop, sniffing the format from the file contents so a crop
/// saved under the wrong extension still loads.
fn decode_gray(path: &Path) -> anyhow::Result<GrayImage> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .with_context(|| format!("cannot open {}", path.display()))?;
    Ok(reader.decode()?.to_luma8())
}

/// Decode every file of a group to 8-bit grayscale.
pub fn load_group(id: &str, paths: &BTreeMap<String, PathBuf>) -> GroupImages {
    let images = paths
        .iter()
        .map(|(key, path)| {
            let loaded = match decode_gray(path) {
                Ok(img) => LoadedImage::Ready(img),
                Err(e) => {
                    log::warn!("[source] cannot decode {}: {e:#}", path.display());
                    LoadedImage::Unreadable(format!("{e:#}"))
                }
            };
            (key.clone(), loaded)
        })
        .collect();
    GroupImages {
        id: id.to_string(),
        images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_classified() {
        assert_eq!(
            detect_field_and_source("Angle_SR_crop.png"),
            Some((Field::Angle, SourceVariant::Sr))
        );
        assert_eq!(
            detect_field_and_source("temperature_v7.jpg"),
            Some((Field::Temperature, SourceVariant::V7))
        );
        assert_eq!(
            detect_field_and_source("depth_x_v8.bmp"),
            Some((Field::Depth, SourceVariant::V8))
        );
        assert_eq!(detect_field_and_source("pressure_sr.png"), None);
        assert_eq!(detect_field_and_source("depth_v9.png"), None);
    }

    #[test]
    fn extensions_are_case_insensitive() {
        assert!(has_image_ext(Path::new("a/angle_sr.PNG")));
        assert!(has_image_ext(Path::new("angle_sr.webp")));
        assert!(!has_image_ext(Path::new("angle_sr.txt")));
        assert!(!has_image_ext(Path::new("angle_sr")));
    }
}
