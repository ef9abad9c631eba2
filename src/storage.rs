//! On-disk storage for uploaded property images and their thumbnails.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use image::{imageops::FilterType, DynamicImage, ImageFormat};
use thiserror::Error;

use crate::config::StorageConfig;

/// Accepted upload extensions (lower-case).
pub const ALLOWED_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "png", "tiff"];

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file type '{0}' is not allowed")]
    UnsupportedExtension(String),
    #[error("invalid file name")]
    InvalidFileName,
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to write image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("image task failed: {0}")]
    Task(String),
}

/// Name of the thumbnail stored next to `path`: `dir/photo.jpg` -> `dir/photo_thumb.jpg`.
pub fn thumbnail_name(path: &str) -> String {
    let (dir, file) = match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    };
    match file.rfind('.') {
        Some(i) if i > 0 => format!("{}{}_thumb{}", dir, &file[..i], &file[i..]),
        _ => format!("{}{}_thumb", dir, file),
    }
}

/// Reduces an uploaded file name to ASCII letters, digits, `_`, `-` and `.`,
/// with whitespace and path separators turned into `_`.
pub fn secure_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_whitespace() || c == '/' || c == '\\' {
            pending_sep = true;
            continue;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        }
    }
    out.trim_start_matches(['.', '_']).to_string()
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name).extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase())
}

/// Uploaded originals and derived thumbnails under one base directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    base: PathBuf,
    thumb_width: u32,
    thumb_height: u32,
    crop: bool,
}

impl ImageStore {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self {
            base: PathBuf::from(&cfg.base_path),
            thumb_width: cfg.thumbnail_width,
            thumb_height: cfg.thumbnail_height,
            crop: cfg.thumbnail_crop,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    pub fn ensure_base_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.base)
    }

    /// Resolves a stored relative path, refusing anything that would escape the base directory.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let rel = Path::new(relative);
        let safe = !relative.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.base.join(rel))
    }

    pub fn thumbnail_exists(&self, relative: &str) -> bool {
        self.resolve(&thumbnail_name(relative)).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Validates and writes an upload plus its thumbnail. Returns the path to
    /// store in the image row. Existing files are never overwritten: a taken
    /// name gets a `_1`, `_2`, ... suffix on its stem.
    pub async fn save(&self, original_name: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let filename = secure_filename(original_name);
        let ext = extension_of(&filename).ok_or(StorageError::InvalidFileName)?;
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(StorageError::UnsupportedExtension(ext));
        }
        self.resolve(&filename).ok_or(StorageError::InvalidFileName)?;
        let (width, height, crop) = (self.thumb_width, self.thumb_height, self.crop);
        let store = self.clone();

        tokio::fs::create_dir_all(&self.base).await?;
        let stored = tokio::task::spawn_blocking(move || -> Result<String, StorageError> {
            let decoded = image::load_from_memory(&bytes).map_err(|e| StorageError::InvalidImage(e.to_string()))?;
            let (name, mut file) = store.claim(&filename)?;
            let written = file.write_all(&bytes).map_err(StorageError::from).and_then(|_| {
                let thumb_target = store.resolve(&thumbnail_name(&name)).ok_or(StorageError::InvalidFileName)?;
                save_image(&make_thumbnail(&decoded, width, height, crop), &thumb_target, &ext)
            });
            if let Err(e) = written {
                if let Some(target) = store.resolve(&name) {
                    let _ = std::fs::remove_file(target);
                }
                return Err(e);
            }
            Ok(name)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;

        tracing::info!("Stored image {} in {}", stored, self.base.display());
        Ok(stored)
    }

    /// Creates the first free variant of `filename` whose thumbnail name is
    /// free as well. `create_new` makes the claim atomic between concurrent uploads.
    fn claim(&self, filename: &str) -> Result<(String, std::fs::File), StorageError> {
        let (stem, ext) = match filename.rfind('.') {
            Some(i) if i > 0 => filename.split_at(i),
            _ => (filename, ""),
        };
        for n in 0..MAX_NAME_ATTEMPTS {
            let candidate = if n == 0 { filename.to_string() } else { format!("{}_{}{}", stem, n, ext) };
            let target = self.resolve(&candidate).ok_or(StorageError::InvalidFileName)?;
            if self.resolve(&thumbnail_name(&candidate)).map(|p| p.exists()).unwrap_or(true) {
                continue;
            }
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => return Ok((candidate, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {}", filename),
        )))
    }

    /// Best-effort removal of an original and its thumbnail. Each removal is
    /// independent; a missing file is not an error and nothing is reported.
    pub async fn remove(&self, relative: &str) {
        for name in [relative.to_string(), thumbnail_name(relative)] {
            let Some(path) = self.resolve(&name) else {
                continue;
            };
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::debug!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
    }
}

fn make_thumbnail(img: &DynamicImage, width: u32, height: u32, crop: bool) -> DynamicImage {
    if crop {
        img.resize_to_fill(width, height, FilterType::Lanczos3)
    } else {
        img.thumbnail(width, height)
    }
}

fn save_image(img: &DynamicImage, path: &Path, ext: &str) -> Result<(), StorageError> {
    let format = ImageFormat::from_extension(ext).ok_or_else(|| StorageError::UnsupportedExtension(ext.to_string()))?;
    match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()).save_with_format(path, format)?,
        _ => img.save_with_format(path, format)?,
    }
    Ok(())
}
