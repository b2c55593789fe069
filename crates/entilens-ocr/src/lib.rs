//! Entilens OCR - Optical Character Recognition fallback
//!
//! Scanned PDFs carry no text layer. This crate rasterizes their pages with
//! poppler's `pdftoppm` and runs Tesseract over each page image. Both tools
//! are invoked as external processes.

use std::path::{Path, PathBuf};
use std::process::Command;

use entilens_core::OcrConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("PDF rasterization failed: {0}")]
    RasterizationFailed(String),

    #[error("OCR execution failed: {0}")]
    ExecutionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OcrError>;

impl From<OcrError> for entilens_core::EntilensError {
    fn from(err: OcrError) -> Self {
        Self::DocumentError(err.to_string())
    }
}

/// OCR result for a single page
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Extracted text content
    pub text: String,
    /// Page number
    pub page: u32,
    /// Language codes used
    pub language: Option<String>,
}

impl OcrResult {
    /// Create a new OCR result
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: 1,
            language: None,
        }
    }

    /// Set page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Trait for OCR engines
pub trait OcrEngine: Send + Sync {
    /// Extract text from an image file
    fn extract_text(&self, image_path: &Path) -> Result<OcrResult>;

    /// Extract text from multiple images (e.g., PDF pages)
    fn extract_text_batch(&self, image_paths: &[PathBuf]) -> Result<Vec<OcrResult>> {
        image_paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let result = self.extract_text(path)?;
                Ok(result.with_page((i + 1) as u32))
            })
            .collect()
    }

    /// Check if the engine is available on the system
    fn is_available(&self) -> bool;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Check that an executable answers `--version`
fn probe_executable(executable: &str, version_flag: &str) -> bool {
    Command::new(executable)
        .arg(version_flag)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// ============================================================================
// Tesseract OCR Engine
// ============================================================================

/// Tesseract OCR engine configuration
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// Language code(s) for OCR (e.g., "eng", "eng+deu")
    pub language: String,
    /// Page segmentation mode (PSM)
    pub psm: Option<u8>,
    /// OCR engine mode (OEM)
    pub oem: Option<u8>,
    /// Path to tesseract executable
    pub executable_path: Option<String>,
    /// Additional tesseract arguments
    pub extra_args: Vec<String>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: None,
            oem: None,
            executable_path: None,
            extra_args: Vec::new(),
        }
    }
}

impl TesseractConfig {
    /// Build from the application OCR settings
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            psm: config.psm,
            oem: None,
            executable_path: config.tesseract_path.clone(),
            extra_args: Vec::new(),
        }
    }

    /// Set language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set page segmentation mode
    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = Some(psm);
        self
    }

    /// Set OCR engine mode
    pub fn with_oem(mut self, oem: u8) -> Self {
        self.oem = Some(oem);
        self
    }
}

/// Tesseract OCR engine wrapper
pub struct TesseractEngine {
    config: TesseractConfig,
}

impl TesseractEngine {
    /// Create a new Tesseract engine with default config
    pub fn new() -> Self {
        Self {
            config: TesseractConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Get the tesseract executable path
    fn executable(&self) -> &str {
        self.config
            .executable_path
            .as_deref()
            .unwrap_or("tesseract")
    }

    /// Build command arguments
    fn build_args(&self, image_path: &Path) -> Vec<String> {
        let mut args = vec![
            image_path.display().to_string(),
            "stdout".to_string(), // Output to stdout
            "-l".to_string(),
            self.config.language.clone(),
        ];

        if let Some(psm) = self.config.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }

        if let Some(oem) = self.config.oem {
            args.push("--oem".to_string());
            args.push(oem.to_string());
        }

        args.extend(self.config.extra_args.clone());
        args
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn extract_text(&self, image_path: &Path) -> Result<OcrResult> {
        let args = self.build_args(image_path);

        let output = Command::new(self.executable())
            .args(&args)
            .output()
            .map_err(|e| {
                OcrError::EngineNotAvailable(format!("cannot run {}: {e}", self.executable()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ExecutionFailed(format!(
                "Tesseract failed: {stderr}"
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();

        Ok(OcrResult::new(text).with_language(self.config.language.clone()))
    }

    fn is_available(&self) -> bool {
        probe_executable(self.executable(), "--version")
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

// ============================================================================
// PDF Rasterization
// ============================================================================

/// Renders PDF pages to image files
pub trait PdfRasterizer: Send + Sync {
    /// Render every page of `pdf_path` into `output_dir`, returning image paths in page order
    fn rasterize(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>>;

    /// Check if the rasterizer can run on this system
    fn is_available(&self) -> bool;
}

/// Rasterizer backed by poppler's `pdftoppm`
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    /// Path to pdftoppm executable
    pub executable_path: Option<String>,
    /// Output resolution
    pub dpi: u32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            executable_path: None,
            dpi: 300,
        }
    }
}

impl PdftoppmRasterizer {
    /// Build from the application OCR settings
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            executable_path: config.pdftoppm_path.clone(),
            dpi: config.dpi,
        }
    }

    fn executable(&self) -> &str {
        self.executable_path.as_deref().unwrap_or("pdftoppm")
    }

    fn build_args(&self, pdf_path: &Path, prefix: &Path) -> Vec<String> {
        vec![
            "-r".to_string(),
            self.dpi.to_string(),
            "-png".to_string(),
            pdf_path.display().to_string(),
            prefix.display().to_string(),
        ]
    }
}

/// Sort key for `page-1.png`, `page-02.png`, ... (pdftoppm zero-pads by page count)
fn page_number(path: &Path) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .rsplit('-')
        .next()?
        .parse()
        .ok()
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let prefix = output_dir.join("page");
        let output = Command::new(self.executable())
            .args(self.build_args(pdf_path, &prefix))
            .output()
            .map_err(|e| {
                OcrError::EngineNotAvailable(format!("cannot run {}: {e}", self.executable()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RasterizationFailed(stderr.trim().to_string()));
        }

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(output_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("png"))
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    fn is_available(&self) -> bool {
        probe_executable(self.executable(), "-v")
    }
}

// ============================================================================
// OCR Manager
// ============================================================================

/// OCR manager that handles multiple engines
pub struct OcrManager {
    engines: Vec<Box<dyn OcrEngine>>,
}

impl OcrManager {
    /// Create a manager with no engines
    pub fn empty() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    /// Create a new OCR manager with the default engines that are installed
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    /// Create from application settings, registering Tesseract when installed
    pub fn from_config(config: &OcrConfig) -> Self {
        let mut manager = Self::empty();

        let tesseract = TesseractEngine::with_config(TesseractConfig::from_config(config));
        if tesseract.is_available() {
            manager.register(tesseract);
        } else {
            tracing::info!("Tesseract not found, OCR fallback disabled");
        }

        manager
    }

    /// Register an OCR engine
    pub fn register<E: OcrEngine + 'static>(&mut self, engine: E) {
        self.engines.push(Box::new(engine));
    }

    /// Check if any OCR engine is available
    pub fn is_available(&self) -> bool {
        !self.engines.is_empty()
    }

    /// Get available engines
    pub fn available_engines(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    fn engine(&self) -> Result<&dyn OcrEngine> {
        self.engines
            .first()
            .map(|e| e.as_ref())
            .ok_or_else(|| OcrError::EngineNotAvailable("No OCR engines available".to_string()))
    }

    /// Extract text using the first available engine
    pub fn extract_text(&self, image_path: &Path) -> Result<OcrResult> {
        self.engine()?.extract_text(image_path)
    }

    /// Extract text from multiple images
    pub fn extract_text_batch(&self, image_paths: &[PathBuf]) -> Result<Vec<OcrResult>> {
        self.engine()?.extract_text_batch(image_paths)
    }
}

impl Default for OcrManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Scanned PDF OCR
// ============================================================================

/// Recovers the text of a scanned PDF: rasterize, then OCR page by page
pub struct ScannedPdfOcr {
    rasterizer: Box<dyn PdfRasterizer>,
    manager: OcrManager,
}

impl ScannedPdfOcr {
    pub fn new(rasterizer: impl PdfRasterizer + 'static, manager: OcrManager) -> Self {
        Self {
            rasterizer: Box::new(rasterizer),
            manager,
        }
    }

    /// Build with pdftoppm and Tesseract from application settings
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            PdftoppmRasterizer::from_config(config),
            OcrManager::from_config(config),
        )
    }

    /// Both a rasterizer and an OCR engine are installed
    pub fn is_available(&self) -> bool {
        self.manager.is_available() && self.rasterizer.is_available()
    }

    /// Run OCR over an in-memory PDF and join the page texts with newlines
    pub fn extract_pdf(&self, pdf_bytes: &[u8]) -> Result<Vec<OcrResult>> {
        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::write(&pdf_path, pdf_bytes)?;

        let pages_dir = workdir.path().join("pages");
        std::fs::create_dir(&pages_dir)?;

        let images = self.rasterizer.rasterize(&pdf_path, &pages_dir)?;
        if images.is_empty() {
            return Err(OcrError::RasterizationFailed(
                "no pages were rendered".to_string(),
            ));
        }
        tracing::debug!(pages = images.len(), "Rasterized PDF for OCR");

        self.manager.extract_text_batch(&images)
    }

    /// Convenience wrapper returning the joined text
    pub fn extract_pdf_text(&self, pdf_bytes: &[u8]) -> Result<String> {
        let pages = self.extract_pdf(pdf_bytes)?;
        Ok(pages
            .into_iter()
            .map(|page| page.text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

// ============================================================================
// Tests
// ============================================================================
