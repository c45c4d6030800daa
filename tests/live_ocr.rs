//! Live round trip against the real OCR.space endpoint.
//!
//! Opt-in with OCR_LIVE_TEST=1. Uses OCR_SPACE_API_KEY from .env.local or
//! .env when present, the demo key otherwise.

use base64::Engine as _;
use snaptext::config::{self, OcrConfig};
use snaptext::encode::EncodedPayload;
use snaptext::ocr::{interpret, OcrBackend, OcrOutcome, OcrSpaceClient};

fn load_env() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    match config::load_env_files(manifest_dir) {
        Some(path) => eprintln!("[TEST] Loaded {}", path.display()),
        None => eprintln!("[TEST] No env file in {}", manifest_dir.display()),
    }
}

fn blank_page_jpeg() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(320, 240, image::Rgb([250, 250, 250]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn blank_page_round_trip() {
    if std::env::var("OCR_LIVE_TEST").map(|v| v != "1").unwrap_or(true) {
        eprintln!("SKIP: OCR_LIVE_TEST not set");
        return;
    }
    load_env();

    let config = OcrConfig::from_env();
    eprintln!("[TEST] Demo key: {}", config.uses_demo_key());
    let client = OcrSpaceClient::new(config);

    let payload = EncodedPayload::new(base64::engine::general_purpose::STANDARD.encode(blank_page_jpeg()));

    let start = std::time::Instant::now();
    let raw = match client.submit(&payload).await {
        Ok(raw) => raw,
        Err(e) => panic!("live submission failed: {}", e),
    };
    eprintln!("[TEST] HTTP {} in {}ms", raw.status, start.elapsed().as_millis());

    let (outcome, trace) = interpret(&raw);
    eprintln!("[TEST] Trace:\n{}", trace);
    assert!(
        matches!(outcome, OcrOutcome::Empty | OcrOutcome::Success(_)),
        "blank page should not fail: {:?}",
        outcome
    );
}
