// Text recognition boundary
// The pipeline never sees images; it consumes whatever text the external
// recognizer produced.

use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::info;

/// Black-box producer of recognized text from an uploaded image.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String>;
}

/// Recognizer backed by the external Tesseract binary.
///
/// Requires `tesseract` on PATH (or the command configured in
/// [`crate::config::AppConfig`]). Install:
/// - Linux: sudo apt-get install tesseract-ocr
/// - Mac: brew install tesseract
pub struct TesseractOcr {
    command: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Probe for the binary so startup can warn before the first upload fails.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .is_ok()
    }
}

impl TextRecognizer for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        let scratch = tempfile::tempdir().context("Failed to create OCR scratch directory")?;

        let input = scratch.path().join("receipt.png");
        std::fs::write(&input, image).context("Failed to write uploaded image")?;

        // Tesseract writes `<stem>.txt` next to the requested output stem.
        let output_stem = scratch.path().join("receipt");
        let output = Command::new(&self.command)
            .arg(&input)
            .arg(&output_stem)
            .arg("-l")
            .arg("eng")
            .output()
            .with_context(|| format!("Failed to run '{}'", self.command))?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = std::fs::read_to_string(output_stem.with_extension("txt"))
            .context("Failed to read tesseract output")?;

        info!("OCR produced {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_probe_does_not_panic() {
        let ocr = TesseractOcr::new("tesseract");

        if ocr.is_available() {
            println!("Tesseract is available");
        } else {
            println!("Tesseract is not installed");
        }
    }

    #[test]
    fn missing_binary_is_an_error_not_a_panic() {
        let ocr = TesseractOcr::new("definitely-not-a-real-ocr-binary");
        assert!(ocr.recognize(b"not an image").is_err());
    }
}
