//! Line text recognition
//!
//! [`OnnxLineRecognizer`] runs a CRNN recognition model exported to ONNX over
//! one stripe image and decodes its output with greedy CTC.

use crate::config::OcrConfig;
use crate::domain::{RedlineError, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::{Array4, ArrayViewD};
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};

/// Model input height in pixels
pub const REC_IMAGE_HEIGHT: u32 = 48;
/// Widest input accepted; longer stripes are squeezed
pub const REC_MAX_WIDTH: u32 = 3200;

/// CTC blank class index
const BLANK: usize = 0;

/// Recognizes the text of one image
pub trait TextRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String>;
}

/// Creates recognizers on demand
pub trait RecognizerLoader: Send + Sync {
    /// Whether `load` can be expected to succeed
    fn is_available(&self) -> bool;

    fn load(&self) -> Result<Box<dyn TextRecognizer + Send>>;
}

fn ocr_error(context: &str, err: impl std::fmt::Display) -> RedlineError {
    RedlineError::Ocr(format!("{context}: {err}"))
}

/// CRNN recognizer backed by ONNX Runtime
pub struct OnnxLineRecognizer {
    session: Session,
    charset: Vec<String>,
}

impl OnnxLineRecognizer {
    pub fn new(model_path: &Path, charset_path: &Path, intra_threads: usize) -> Result<Self> {
        let mut builder =
            Session::builder().map_err(|e| ocr_error("Failed to create ONNX session", e))?;
        if intra_threads > 0 {
            builder = builder
                .with_intra_threads(intra_threads)
                .map_err(|e| ocr_error("Invalid thread settings", e))?;
        }
        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| ocr_error("Failed to load recognition model", e))?;

        let charset = load_charset(charset_path)?;
        tracing::info!(
            model = %model_path.display(),
            charset_size = charset.len(),
            "Recognition model loaded"
        );

        Ok(Self { session, charset })
    }
}

impl TextRecognizer for OnnxLineRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String> {
        let input = prepare_input(image);
        let tensor = Tensor::from_array(input).map_err(|e| ocr_error("Invalid input tensor", e))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| ocr_error("Recognition failed", e))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ocr_error("Unexpected model output", e))?;

        Ok(decode_ctc(&output, &self.charset))
    }
}

/// Loads [`OnnxLineRecognizer`]s from the configured model files
#[derive(Debug, Clone)]
pub struct OnnxLoader {
    model_path: PathBuf,
    charset_path: PathBuf,
    intra_threads: usize,
}

impl OnnxLoader {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            model_path: PathBuf::from(&config.model_path),
            charset_path: PathBuf::from(&config.charset_path),
            intra_threads: config.intra_threads,
        }
    }
}

impl RecognizerLoader for OnnxLoader {
    fn is_available(&self) -> bool {
        self.model_path.is_file() && self.charset_path.is_file()
    }

    fn load(&self) -> Result<Box<dyn TextRecognizer + Send>> {
        let recognizer =
            OnnxLineRecognizer::new(&self.model_path, &self.charset_path, self.intra_threads)?;
        Ok(Box::new(recognizer))
    }
}

/// Resize to the model height and normalize to NCHW, BGR, `(x/255 - 0.5) / 0.5`
pub fn prepare_input(image: &DynamicImage) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (w, h) = (rgb.width().max(1), rgb.height().max(1));
    let ratio = REC_IMAGE_HEIGHT as f32 / h as f32;
    let new_w = ((w as f32 * ratio).round() as u32).clamp(1, REC_MAX_WIDTH);

    let resized = image::imageops::resize(&rgb, new_w, REC_IMAGE_HEIGHT, FilterType::Triangle);

    let (rw, rh) = (resized.width() as usize, resized.height() as usize);
    let mut tensor = Array4::<f32>::zeros((1, 3, rh, rw));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = (pixel[2] as f32 / 255.0 - 0.5) / 0.5;
        tensor[[0, 1, y, x]] = (pixel[1] as f32 / 255.0 - 0.5) / 0.5;
        tensor[[0, 2, y, x]] = (pixel[0] as f32 / 255.0 - 0.5) / 0.5;
    }
    tensor
}

/// Greedy CTC decoding of a `[batch, time, classes]` output, first batch only
///
/// Class 0 is the blank; class `i` maps to `charset[i - 1]`.
pub fn decode_ctc(output: &ArrayViewD<f32>, charset: &[String]) -> String {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] == 0 {
        return String::new();
    }
    let (steps, classes) = (shape[1], shape[2]);

    let mut text = String::new();
    let mut last: Option<usize> = None;

    for t in 0..steps {
        let mut best = BLANK;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..classes {
            let score = output[[0, t, c]];
            if score > best_score {
                best_score = score;
                best = c;
            }
        }

        if best != BLANK && Some(best) != last {
            if let Some(symbol) = charset.get(best - 1) {
                text.push_str(symbol);
            }
        }
        last = Some(best);
    }

    text
}

/// One symbol per line; a trailing space symbol is appended when missing
fn load_charset(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ocr_error(&format!("Failed to read charset {}", path.display()), e))?;
    let mut charset: Vec<String> = content.lines().map(str::to_string).collect();
    if charset.is_empty() {
        return Err(RedlineError::Ocr(format!(
            "Charset {} is empty",
            path.display()
        )));
    }
    if !charset.iter().any(|s| s == " ") {
        charset.push(" ".to_string());
    }
    Ok(charset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn one_hot(sequence: &[usize], classes: usize) -> Array3<f32> {
        let mut out = Array3::<f32>::zeros((1, sequence.len(), classes));
        for (t, &c) in sequence.iter().enumerate() {
            out[[0, t, c]] = 1.0;
        }
        out
    }

    #[test]
    fn test_ctc_collapses_repeats_and_blanks() {
        let charset: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        // a a _ a b b _ c
        let output = one_hot(&[1, 1, 0, 1, 2, 2, 0, 3], 4).into_dyn();
        assert_eq!(decode_ctc(&output.view(), &charset), "aabc");
    }

    #[test]
    fn test_ctc_ignores_out_of_range_classes() {
        let charset = vec!["x".to_string()];
        let output = one_hot(&[1, 5], 6).into_dyn();
        assert_eq!(decode_ctc(&output.view(), &charset), "x");
    }

    #[test]
    fn test_prepare_input_shape() {
        let image = DynamicImage::new_rgb8(200, 100);
        let tensor = prepare_input(&image);
        assert_eq!(tensor.shape(), &[1, 3, 48, 96]);
        // black pixels normalize to -1
        assert_eq!(tensor[[0, 0, 0, 0]], -1.0);
    }

    #[test]
    fn test_charset_gets_space() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "a\nb\n").unwrap();
        let charset = load_charset(file.path()).unwrap();
        assert_eq!(charset, vec!["a", "b", " "]);
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let loader = OnnxLoader::new(&OcrConfig {
            model_path: "/nonexistent/rec.onnx".to_string(),
            ..Default::default()
        });
        assert!(!loader.is_available());
    }
}
