//! Integration test: drive a processor through a typical editing session.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pixelart_pipeline::{
    Bitmap, ColorMode, EdgeMode, ImageProcessor, MemoryTarget, Outcome, PixelationOptions,
    PresetId, ProcessorConfig, ProcessorState, Rgba, pixelate_blocking,
};

/// Four colored quadrants with a translucent bottom row.
fn quadrants(width: u32, height: u32) -> Bitmap {
    Bitmap::from_fn(width, height, |x, y| {
        let alpha = if y + 1 == height { 128 } else { 255 };
        match (x < width / 2, y < height / 2) {
            (true, true) => Rgba([230, 30, 30, alpha]),
            (false, true) => Rgba([30, 200, 60, alpha]),
            (true, false) => Rgba([40, 60, 220, alpha]),
            (false, false) => Rgba([250, 240, 90, alpha]),
        }
    })
}

fn png(bitmap: &Bitmap) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        bitmap.as_raw(),
        bitmap.width(),
        bitmap.height(),
        image::ExtendedColorType::Rgba8,
    )
    .unwrap();
    buf
}

#[tokio::test]
async fn upload_process_navigate() {
    let mut processor = ImageProcessor::new(
        MemoryTarget::Available,
        MemoryTarget::Available,
        ProcessorConfig::default(),
    )
    .expect("memory targets are always available");

    let source = quadrants(64, 48);
    let dims = processor.load_bytes(&png(&source)).unwrap();
    assert_eq!((dims.width, dims.height), (64, 48));
    assert_eq!(*processor.state(), ProcessorState::Loaded);

    // Automatic first pass with the defaults.
    let defaults = PixelationOptions::default();
    assert_eq!(processor.process(defaults).await.unwrap(), Outcome::Applied);
    let first = processor.processed().cloned().unwrap();
    assert_eq!(first.dimensions(), (64, 48));
    assert_eq!(first, pixelate_blocking(&source, &defaults));

    // Two presets, then step back through them.
    processor.apply_preset(PresetId::Minecraft).await.unwrap();
    processor.apply_preset(PresetId::Mosaic).await.unwrap();
    assert_eq!(processor.history().len(), 3);

    assert!(processor.undo().unwrap());
    assert_eq!(
        processor.options(),
        PixelationOptions::new(16, ColorMode::Retro, EdgeMode::Hard)
    );
    assert!(processor.undo().unwrap());
    assert_eq!(processor.processed(), Some(&first));
    assert!(!processor.can_undo());

    // A fresh edit drops the redo tail.
    processor
        .process(PixelationOptions::new(4, ColorMode::Grayscale, EdgeMode::Soft))
        .await
        .unwrap();
    assert!(!processor.can_redo());
    assert_eq!(processor.history().len(), 2);

    for pixel in processor.processed().unwrap().pixels() {
        assert_eq!(pixel.0[0], pixel.0[1]);
        assert_eq!(pixel.0[1], pixel.0[2]);
    }
}

#[tokio::test]
async fn retro_output_uses_only_palette_colors() {
    let mut processor = ImageProcessor::new(
        MemoryTarget::Available,
        MemoryTarget::Available,
        ProcessorConfig::default(),
    )
    .unwrap();
    processor.load_bitmap(quadrants(40, 40)).unwrap();
    processor.apply_preset(PresetId::Game).await.unwrap();

    for pixel in processor.processed().unwrap().pixels() {
        let rgb = [pixel.0[0], pixel.0[1], pixel.0[2]];
        assert!(pixelart_pipeline::color::RETRO_PALETTE.contains(&rgb));
    }
}

#[test]
fn history_capacity_comes_from_config() {
    let config: ProcessorConfig = serde_json::from_str(r#"{"historyCapacity": 2}"#).unwrap();
    let mut processor =
        ImageProcessor::new(MemoryTarget::Available, MemoryTarget::Available, config).unwrap();
    processor.load_bitmap(quadrants(8, 8)).unwrap();

    for size in 1..=4 {
        let options = PixelationOptions::new(size, ColorMode::Original, EdgeMode::Hard);
        let ticket = processor.begin(options).unwrap();
        let result = pixelate_blocking(ticket.source(), &ticket.options());
        processor.finish(ticket, result).unwrap();
    }
    assert_eq!(processor.history().len(), 2);
    assert_eq!(processor.history().get(0).unwrap().options.pixel_size, 3);
}
