// Upload decoder - bytes from a user upload into a classifiable frame

use crate::error::{Error, Result};
use crate::types::{Frame, FrameOrigin};
use image::ImageFormat;
use tracing::debug;

/// Largest upload accepted (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Decodes uploaded image files
#[derive(Debug, Clone, Copy)]
pub struct UploadDecoder {
    max_bytes: usize,
}

impl Default for UploadDecoder {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadDecoder {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Decode `bytes` into a frame
    ///
    /// The format is sniffed from the content, not taken from a file name.
    ///
    /// # Errors
    /// `Error::Decode` for empty, oversized or undecodable input
    pub async fn decode(&self, bytes: Vec<u8>) -> Result<Frame> {
        if bytes.is_empty() {
            return Err(Error::Decode("upload is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(Error::Decode(format!(
                "upload is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }

        let format = image::guess_format(&bytes)
            .map_err(|e| Error::Decode(format!("unrecognized image format: {}", e)))?;

        let image = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&bytes, format)
        })
        .await
        .map_err(|e| Error::Decode(format!("decode task failed: {}", e)))?
        .map_err(|e| Error::Decode(e.to_string()))?;

        debug!(
            format = format_name(format),
            width = image.width(),
            height = image.height(),
            "Upload decoded"
        );
        Ok(Frame::new(image, FrameOrigin::Upload))
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("unknown")
}
