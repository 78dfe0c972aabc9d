//! Example: load a font, print its names and measure a few strings
//!
//! ```text
//! RUST_LOG=fos_fontmap=debug cargo run -p fos-fontmap --example measure -- /path/to/font.ttf 18
//! ```

use std::sync::Arc;

use anyhow::Context;
use fos_fontmap::{Color, FontFile, HAlignment, NameId, RendererConfig, SoftwareGpu, TextDecoration};
use tracing_subscriber::EnvFilter;

const SAMPLES: &[&str] = &["Hello, world!", "AVAST ye Tokyo", "Wavy Yellow Type", "iiiiiiii"];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string());
    let size: f32 = match args.next() {
        Some(size) => size.parse().context("pixel size must be a number")?,
        None => 16.0,
    };

    let font = Arc::new(FontFile::open(&path).with_context(|| format!("loading {path}"))?);
    for id in NameId::ALL {
        println!("{id:?}: {}", font.metadata().get(id).unwrap_or("-"));
    }
    println!("kerning pairs: {}", font.kerning().len());

    let mut gpu = SoftwareGpu::new();
    let mut renderer = font.create_renderer(size, &mut gpu, RendererConfig::default())?;
    println!(
        "line height {}, baseline {}, space {}, ex {}, proportional {}",
        renderer.line_height(),
        renderer.baseline(),
        renderer.space_width(),
        renderer.ex(),
        renderer.is_proportional()
    );

    for text in SAMPLES {
        let width = renderer.measure_width(text);
        let fits = renderer.count_visible_glyphs(text, width / 2);
        println!("{text:>20}: {width}px, {fits} glyphs fit in half");
    }

    let paragraph = SAMPLES.join("\n");
    let box_width = renderer.multi_line_width(&paragraph);
    for line in renderer.layout_multi_line(&paragraph, box_width, HAlignment::Center) {
        println!("line width {} offset {}", line.width, line.x_offset);
    }

    let line_height = renderer.line_height();
    {
        let mut batch = renderer.begin_batch(&mut gpu, Color::BLACK);
        batch.draw_decorated_text(0, 0, SAMPLES[0], TextDecoration::UNDERLINE);
        batch.draw_multi_line_text(0, line_height, &paragraph, box_width, HAlignment::Right);
    }
    println!(
        "{} draw calls, {} quads",
        gpu.calls.len(),
        gpu.quads().count()
    );

    renderer.destroy(&mut gpu);
    Ok(())
}
