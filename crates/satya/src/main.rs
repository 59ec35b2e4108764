use std::sync::Arc;

use satya_core::{
    config::Config,
    ports::{AnalysisBackend, TextRecognizer},
};
use satya_openai::OpenAiClient;
use satya_tesseract::TesseractOcr;

#[tokio::main]
async fn main() -> Result<(), satya_core::Error> {
    satya_core::logging::init("satya")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        temp_dir = %cfg.temp_dir.display(),
        tesseract = %cfg.tesseract_path.display(),
        "configuration loaded"
    );

    let backend: Arc<dyn AnalysisBackend> = Arc::new(OpenAiClient::from_config(&cfg)?);
    let ocr: Arc<dyn TextRecognizer> = Arc::new(TesseractOcr::from_config(&cfg));

    satya_telegram::router::run_polling(cfg, backend, ocr)
        .await
        .map_err(|e| satya_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
