// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Loads a labelled image set laid out one folder per class:
//
//   root/
//     cat/   0001.png 0002.jpg ...
//     dog/   0001.png ...
//
// Class folders are sorted by name and numbered from 0, so the
// same folder names always map to the same label indices.
//
// Every image is decoded with the `image` crate, resized to
// size × size, converted to RGB and stored channel-first with
// values scaled to [0, 1].
//
// Reference: image crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::dataset::ImageSample;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
const CHANNELS: usize = 3;

/// Class names plus every decoded sample of one image folder.
#[derive(Debug, Clone)]
pub struct LabelledImages {
    pub classes: Vec<String>,
    pub samples: Vec<ImageSample>,
}

pub struct ImageFolderLoader {
    root:       PathBuf,
    image_size: u32,
}

impl ImageFolderLoader {
    pub fn new(root: impl Into<PathBuf>, image_size: u32) -> Self {
        Self { root: root.into(), image_size }
    }

    /// Discover classes from the sub-folder names and load every image.
    pub fn load(&self) -> Result<LabelledImages> {
        let classes = self.class_dirs()?
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        self.load_as(&classes)
    }

    /// Load images labelling them against an existing class list, so a
    /// test folder gets the same indices as the training folder.
    /// A folder whose name is not in `classes` is an error.
    pub fn load_as(&self, classes: &[String]) -> Result<LabelledImages> {
        let mut samples = Vec::new();

        for (name, dir) in self.class_dirs()? {
            let label = classes
                .iter()
                .position(|c| *c == name)
                .with_context(|| {
                    format!("Unknown class folder '{}' in '{}'", name, self.root.display())
                })?;

            let before = samples.len();
            for path in image_files(&dir)? {
                match self.load_image(&path, label) {
                    Ok(sample) => samples.push(sample),
                    // One unreadable file should not sink the whole dataset
                    Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
                }
            }
            tracing::debug!("Class '{}' (label {}): {} images", name, label, samples.len() - before);
        }

        if samples.is_empty() {
            bail!("No images found under '{}'", self.root.display());
        }

        tracing::info!(
            "Loaded {} images in {} classes from '{}'",
            samples.len(),
            classes.len(),
            self.root.display()
        );
        Ok(LabelledImages { classes: classes.to_vec(), samples })
    }

    /// Sorted (name, path) of every sub-directory of the root.
    fn class_dirs(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs = Vec::new();

        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Cannot read image directory '{}'", self.root.display()))?
        {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                dirs.push((name.to_string(), path.clone()));
            }
        }

        if dirs.is_empty() {
            bail!("'{}' contains no class folders", self.root.display());
        }
        dirs.sort();
        Ok(dirs)
    }

    fn load_image(&self, path: &Path, label: usize) -> Result<ImageSample> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode '{}'", path.display()))?
            .resize_exact(self.image_size, self.image_size, FilterType::Triangle)
            .to_rgb8();

        let size = self.image_size as usize;
        Ok(ImageSample::new(to_chw(&img), [CHANNELS, size, size], label))
    }
}

/// Image files of one class folder, sorted by name for a stable order.
fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read class directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if path.is_file() && is_image {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// HWC u8 pixels → CHW f32 in [0, 1].
fn to_chw(img: &RgbImage) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut out = vec![0.0f32; CHANNELS * plane];

    for (x, y, pixel) in img.enumerate_pixels() {
        let offset = (y * width + x) as usize;
        for c in 0..CHANNELS {
            out[c * plane + offset] = pixel[c] as f32 / 255.0;
        }
    }
    out
}
