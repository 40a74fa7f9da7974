//! Directory capture - replays still images as a camera feed
//!
//! Image files under the source directory are discovered once at setup,
//! sorted by path and then cycled through: each `current_frame` call yields
//! the next file, scaled to the configured size and optionally mirrored.

use super::{CaptureConnector, CaptureDevice};
use crate::error::{Error, Result};
use crate::types::{Frame, FrameOrigin};
use async_trait::async_trait;
use digit_common::CaptureSettings;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions treated as frames
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Acquires [`DirectoryCapture`] devices
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryConnector;

#[async_trait]
impl CaptureConnector for DirectoryConnector {
    async fn setup(&self, settings: &CaptureSettings) -> Result<Box<dyn CaptureDevice>> {
        let device = DirectoryCapture::open(settings).await?;
        Ok(Box::new(device))
    }
}

/// Capture device backed by a directory of images
#[derive(Debug)]
pub struct DirectoryCapture {
    files: Vec<PathBuf>,
    width: u32,
    height: u32,
    flip: bool,
    playing: bool,
    sequence: u64,
}

impl DirectoryCapture {
    /// Scan `settings.source` for frames
    ///
    /// # Errors
    /// `Error::DeviceUnavailable` if the directory is missing or holds no images
    pub async fn open(settings: &CaptureSettings) -> Result<Self> {
        let root = settings.source.clone();
        let files = tokio::task::spawn_blocking(move || find_frame_files(&root))
            .await
            .map_err(|e| Error::DeviceUnavailable(format!("frame scan failed: {}", e)))??;

        info!(
            "Capture source {} opened ({} frames, {}x{})",
            settings.source.display(),
            files.len(),
            settings.width,
            settings.height
        );

        Ok(Self {
            files,
            width: settings.width,
            height: settings.height,
            flip: settings.flip,
            playing: false,
            sequence: 0,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl CaptureDevice for DirectoryCapture {
    async fn play(&mut self) -> Result<()> {
        if self.files.is_empty() {
            return Err(Error::DeviceUnavailable("no frames to play".to_string()));
        }
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    async fn current_frame(&mut self) -> Result<Frame> {
        if !self.playing {
            return Err(Error::DeviceUnavailable("device is not playing".to_string()));
        }

        let index = (self.sequence % self.files.len() as u64) as usize;
        let path = self.files[index].clone();
        let (width, height, flip) = (self.width, self.height, self.flip);

        let image = tokio::task::spawn_blocking(move || -> std::result::Result<_, String> {
            let image = image::open(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
            let image = image.resize_exact(width, height, FilterType::Triangle);
            Ok(if flip { image.fliph() } else { image })
        })
        .await
        .map_err(|e| Error::DeviceUnavailable(format!("frame read failed: {}", e)))?
        .map_err(Error::DeviceUnavailable)?;

        let sequence = self.sequence;
        self.sequence += 1;
        debug!(sequence, "Frame captured");

        Ok(Frame::new(image, FrameOrigin::Capture { sequence }))
    }
}

/// Sorted image files under `root`
fn find_frame_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::DeviceUnavailable(format!(
            "capture source {} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && is_frame_file(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
            Err(e) => warn!("Error accessing entry: {}", e),
        }
    }

    if files.is_empty() {
        return Err(Error::DeviceUnavailable(format!(
            "no image files under {}",
            root.display()
        )));
    }

    files.sort();
    Ok(files)
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| FRAME_EXTENSIONS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn settings(source: &Path) -> CaptureSettings {
        CaptureSettings {
            width: 8,
            height: 6,
            flip: false,
            source: source.to_path_buf(),
        }
    }

    /// 4x2 image, left half black and right half white
    fn write_half_image(path: &Path) {
        let image = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        image.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirectoryCapture::open(&settings(&dir.path().join("absent")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_directory_without_images_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();
        let err = DirectoryConnector
            .setup(&settings(dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_frames_cycle_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write_half_image(&dir.path().join("b.png"));
        write_half_image(&dir.path().join("a.png"));

        let mut device = DirectoryCapture::open(&settings(dir.path())).await.unwrap();
        assert_eq!(device.frame_count(), 2);
        assert!(device.files[0].ends_with("a.png"));

        device.play().await.unwrap();
        let sequences: Vec<_> = [
            device.current_frame().await.unwrap(),
            device.current_frame().await.unwrap(),
            device.current_frame().await.unwrap(),
        ]
        .iter()
        .map(|f| f.origin())
        .collect();
        assert_eq!(
            sequences,
            vec![
                FrameOrigin::Capture { sequence: 0 },
                FrameOrigin::Capture { sequence: 1 },
                FrameOrigin::Capture { sequence: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_frames_are_resized_and_mirrored() {
        let dir = tempfile::tempdir().unwrap();
        write_half_image(&dir.path().join("frame.png"));

        let mut config = settings(dir.path());
        config.flip = true;
        let mut device = DirectoryCapture::open(&config).await.unwrap();
        device.play().await.unwrap();

        let frame = device.current_frame().await.unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));

        let rgb = frame.image().to_rgb8();
        // Mirrored: white half now on the left
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(7, 0), &Rgb([0, 0, 0]));
    }

    #[tokio::test]
    async fn test_paused_device_yields_no_frames() {
        let dir = tempfile::tempdir().unwrap();
        write_half_image(&dir.path().join("frame.png"));

        let mut device = DirectoryCapture::open(&settings(dir.path())).await.unwrap();
        assert!(device.current_frame().await.is_err());

        device.play().await.unwrap();
        assert!(device.is_playing());
        device.stop();
        assert!(!device.is_playing());
        assert!(matches!(
            device.current_frame().await,
            Err(Error::DeviceUnavailable(_))
        ));
    }
}
