//! OCR adapter backed by the `tesseract` CLI.
//!
//! Runs `tesseract <image> stdout -l <lang>` and returns what it prints.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use satya_core::{config::Config, errors::Error, ports::TextRecognizer, Result};

const STDERR_TAIL_MAX_CHARS: usize = 500;

#[derive(Clone, Debug)]
pub struct TesseractOcr {
    program: PathBuf,
    language: String,
}

/// A concrete CLI invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl TesseractOcr {
    pub fn new(program: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.tesseract_path.clone(), cfg.ocr_language.clone())
    }

    pub fn build_invocation(&self, image: &Path) -> OcrInvocation {
        OcrInvocation {
            program: self.program.clone(),
            args: vec![
                image.display().to_string(),
                // Print recognized text instead of writing `<base>.txt`.
                "stdout".to_string(),
                "-l".to_string(),
                self.language.clone(),
            ],
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let skip = text.chars().count().saturating_sub(STDERR_TAIL_MAX_CHARS);
    text.chars().skip(skip).collect()
}

#[async_trait]
impl TextRecognizer for TesseractOcr {
    async fn recognize(&self, image: &Path) -> Result<String> {
        let inv = self.build_invocation(image);

        let output = Command::new(&inv.program)
            .args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                Error::Ocr(format!(
                    "failed to run {}: {e}",
                    inv.program.display()
                ))
            })?;

        if !output.status.success() {
            let mut msg = format!("tesseract exited with {}", output.status);
            let tail = stderr_tail(&output.stderr);
            if !tail.is_empty() {
                msg.push_str(": ");
                msg.push_str(&tail);
            }
            return Err(Error::Ocr(msg));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            image = %image.display(),
            chars = text.chars().count(),
            "tesseract finished"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_prints_to_stdout_with_language() {
        let ocr = TesseractOcr::new("/usr/bin/tesseract", "eng+deu");
        let inv = ocr.build_invocation(Path::new("/tmp/satya/photo_1.jpg"));
        assert_eq!(inv.program, PathBuf::from("/usr/bin/tesseract"));
        assert_eq!(
            inv.args,
            vec!["/tmp/satya/photo_1.jpg", "stdout", "-l", "eng+deu"]
        );
    }

    #[test]
    fn stderr_tail_keeps_last_chars() {
        let long = format!("{}END", "x".repeat(2000));
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.chars().count(), STDERR_TAIL_MAX_CHARS);
        assert!(tail.ends_with("END"));
        assert_eq!(stderr_tail(b"  \n"), "");
    }

    #[tokio::test]
    async fn missing_binary_is_an_ocr_error() {
        let ocr = TesseractOcr::new("/nonexistent/satya-tesseract", "eng");
        let err = ocr
            .recognize(Path::new("/tmp/does-not-matter.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Ocr(_)));
        assert!(err.detail().contains("failed to run"));
    }
}
