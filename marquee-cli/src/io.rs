//! File and clipboard I/O for the terminal front end

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use marquee_core::{from_tlf, Annotations, App, Config, ExportFormat, ImageInfo};

/// Read an image's pixel dimensions without decoding it
pub fn load_image_info(path: &Path) -> Result<ImageInfo> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;

    let (width, height) = image::image_dimensions(&canonical)
        .with_context(|| format!("Failed to read image: {}", canonical.display()))?;

    let name = canonical
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string());

    Ok(ImageInfo { name, width, height })
}

/// Get the marquee data directory, creating it if needed
pub fn marquee_dir() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .context("Could not find data directory")?;
    let dir = base.join("marquee");

    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

/// Default location of `config.json`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("marquee").join("config.json"))
}

/// Load configuration. An explicit path must exist; the default one may be missing.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    Config::from_json_str(&json).with_context(|| format!("Invalid config: {}", path.display()))
}

/// The image path with its extension swapped for `tlf`
pub fn default_export_path(image: &Path) -> PathBuf {
    image.with_extension(ExportFormat::Tlf.extension())
}

/// Write the annotations in the format named by the file extension (`.tlf` if unknown)
pub fn export_annotations(app: &App, path: &Path) -> Result<()> {
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension)
        .unwrap_or(ExportFormat::Tlf);

    let out = app.export(format).context("Failed to serialize annotations")?;

    fs::write(path, out).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), markers = app.annotations.len(), "exported annotations");

    Ok(())
}

/// Read a previously exported `.tlf` file
pub fn load_annotations_file(path: &Path) -> Result<Annotations> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    from_tlf(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Clipboard unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to copy to clipboard")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::{KeyEvent, Key, PointerEvent};
    use std::time::Instant;
    use tempfile::TempDir;

    fn app_with_text(text: &str) -> App {
        let mut app = App::new();
        app.handle_pointer(PointerEvent::down(0.0, 0.0));
        app.handle_pointer(PointerEvent::up(10.0, 20.0));
        app.advance_to_next_marker();
        for c in text.chars() {
            app.handle_key(KeyEvent::down(Key::Char(c)), Instant::now());
        }
        app
    }

    #[test]
    fn test_export_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.tlf");
        let app = app_with_text("cat");

        export_annotations(&app, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1:cat\n\n1{0,0}/{10,20};");

        let restored = load_annotations_file(&path).unwrap();
        assert_eq!(restored.text(marquee_core::MarkerId(1)), "cat");
    }

    #[test]
    fn test_xtlf_export_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.xtlf");
        assert!(export_annotations(&App::new(), &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "min_drag_area": 10.0 }"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.min_drag_area, 10.0);

        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }

    #[test]
    fn test_load_image_info() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::new(4, 3).save(&path).unwrap();

        let info = load_image_info(&path).unwrap();
        assert_eq!((info.name.as_str(), info.width, info.height), ("tiny.png", 4, 3));
        assert!(load_image_info(&dir.path().join("nope.png")).is_err());
    }

    #[test]
    fn test_default_export_path() {
        assert_eq!(
            default_export_path(Path::new("/tmp/shots/photo.png")),
            PathBuf::from("/tmp/shots/photo.tlf")
        );
    }
}
