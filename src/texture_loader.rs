use std::cmp::Ordering;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use exif::{In, Reader, Tag, Value};
use log::warn;
use raylib::prelude::*;

use crate::constants::DEFAULT_SEQUENCE_LEN;

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp" | "gif"))
        .unwrap_or(false)
}

/// Compare file names the way a user naming frames expects: digit runs
/// compare as numbers, so "img2" sorts before "img10".
pub fn compare_numeric(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let mut na = 0u64;
                    while let Some(c) = ai.peek().copied().filter(char::is_ascii_digit) {
                        na = na.saturating_mul(10) + c.to_digit(10).unwrap() as u64;
                        ai.next();
                    }
                    let mut nb = 0u64;
                    while let Some(c) = bi.peek().copied().filter(char::is_ascii_digit) {
                        nb = nb.saturating_mul(10) + c.to_digit(10).unwrap() as u64;
                        bi.next();
                    }
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        ord => return ord,
                    }
                } else {
                    match ca.cmp(&cb) {
                        Ordering::Equal => {
                            ai.next();
                            bi.next();
                        }
                        ord => return ord,
                    }
                }
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name().and_then(|s| s.to_str()).unwrap_or_default().to_lowercase()
}

/// Sort image paths so the sequence order follows the file names.
pub fn sort_image_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| compare_numeric(&file_name_of(a), &file_name_of(b)));
}

/// Collect and sort the image files in a directory.
pub fn load_sorted_image_paths(dir_path: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir_path)
        .with_context(|| format!("failed to read directory {}", dir_path.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.context("failed to read directory entry")?;
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    sort_image_paths(&mut paths);

    if paths.is_empty() {
        Err(anyhow!("no image files found in directory {}", dir_path.display()))
    } else {
        Ok(paths)
    }
}

/// Load an image file into a texture, applying EXIF orientation first.
/// Orientation is only read for JPEGs; anything unreadable falls back to
/// no rotation.
pub fn load_texture_with_exif_rotation(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    image_path: &Path,
) -> Result<Texture2D> {
    let file_bytes = fs::read(image_path)
        .with_context(|| format!("failed to read {}", image_path.display()))?;

    let extension = image_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut orientation = 1;
    if extension == "jpg" || extension == "jpeg" {
        match Reader::new().read_from_container(&mut Cursor::new(&file_bytes)) {
            Ok(exif) => {
                if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
                    if let Value::Short(values) = &field.value {
                        if let Some(&v) = values.first() {
                            orientation = v;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("could not read EXIF data for {}: {e}", image_path.display());
            }
        }
    }

    let mut image = Image::load_image_from_mem(&format!(".{extension}"), &file_bytes)
        .map_err(|e| anyhow!("failed to decode {}: {e}", image_path.display()))?;

    // 1 = normal, 3 = 180 deg, 6 = 90 deg CW, 8 = 90 deg CCW.
    // Flipped orientations are ignored.
    match orientation {
        3 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        6 => image.rotate_cw(),
        8 => image.rotate_ccw(),
        _ => {}
    }

    let texture = rl
        .load_texture_from_image(thread, &image)
        .map_err(|e| anyhow!("failed to create texture for {}: {e}", image_path.display()))?;

    Ok(texture)
}

/// Generated stand-ins shown when the user has not supplied a sequence:
/// checkerboards stepping from a dark calm tone to a bright intense one.
pub fn placeholder_textures(rl: &mut RaylibHandle, thread: &RaylibThread) -> Result<Vec<Texture2D>> {
    let mut textures = Vec::with_capacity(DEFAULT_SEQUENCE_LEN);
    for i in 0..DEFAULT_SEQUENCE_LEN {
        let t = i as f32 / (DEFAULT_SEQUENCE_LEN - 1) as f32;
        let base = Color::new(
            (20.0 + 215.0 * t) as u8,
            (40.0 + 40.0 * t) as u8,
            (90.0 - 60.0 * t) as u8,
            255,
        );
        let accent = Color::new(base.r / 2, base.g / 2, base.b / 2, 255);
        let checks = 32 + i as i32 * 8;
        let image = Image::gen_image_checked(512, 512, checks, checks, base, accent);
        let texture = rl
            .load_texture_from_image(thread, &image)
            .map_err(|e| anyhow!("failed to create placeholder texture: {e}"))?;
        textures.push(texture);
    }
    Ok(textures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_as_numbers() {
        assert_eq!(compare_numeric("img2.png", "img10.png"), Ordering::Less);
        assert_eq!(compare_numeric("img10.png", "img2.png"), Ordering::Greater);
        assert_eq!(compare_numeric("frame_007.jpg", "frame_007.jpg"), Ordering::Equal);
        assert_eq!(compare_numeric("a1b2", "a1b10"), Ordering::Less);
        assert_eq!(compare_numeric("alpha.png", "beta.png"), Ordering::Less);
    }

    #[test]
    fn sorting_respects_numeric_order() {
        let mut paths: Vec<PathBuf> =
            ["img10.png", "img2.png", "img1.png"].iter().map(PathBuf::from).collect();
        sort_image_paths(&mut paths);
        let names: Vec<_> = paths.iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(names, vec!["img1.png", "img2.png", "img10.png"]);
    }

    #[test]
    fn only_image_extensions_are_accepted() {
        assert!(is_image_file(Path::new("shot.PNG")));
        assert!(is_image_file(Path::new("shot.jpeg")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }
}
