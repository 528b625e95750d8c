//! Focus overlay demo: walk a document with the keyboard and print
//! what a screen reader would say.

use ally_a11y::{SpeechError, SpeechOutput};
use ally_dom::KeyboardEvent;
use ally_overlay::{FocusOverlay, OverlayConfig};
use anyhow::Context;

const SAMPLE: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head><title>ALLYINFO</title></head>
<body>
    <header>
        <button id="focus-overlay-toggle">Focus mode</button>
        <nav aria-label="Main">
            <a href="/">Home</a>
            <a href="/resources">Resources</a>
        </nav>
    </header>
    <main>
        <h1>Accessibility resources</h1>
        <p>Guides, checklists and tools.</p>
        <button aria-pressed="false">Dark mode</button>
        <h2>Guides</h2>
        <ul>
            <li><a href="/guides/aria">ARIA basics</a></li>
            <li><a href="/guides/contrast">Colour contrast</a></li>
        </ul>
        <h2>Tools</h2>
        <div role="status"></div>
    </main>
</body>
</html>"#;

/// Speech sink that prints every utterance
struct ConsoleSpeech;

impl SpeechOutput for ConsoleSpeech {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        println!("  🔊 {}", text);
        Ok(())
    }

    fn stop(&mut self) {
        tracing::trace!("speech stopped");
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (html, url) = match std::env::args().nth(1) {
        Some(path) => {
            let html = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path))?;
            (html, format!("file:///{}", path.trim_start_matches('/')))
        }
        None => (SAMPLE.to_string(), "https://allyinfo.example/resources".to_string()),
    };

    let mut doc = ally_html::parse_with_url(&html, &url)?;
    let mut overlay = FocusOverlay::new(OverlayConfig::default(), Box::new(ConsoleSpeech));

    println!("Activating focus overlay...");
    overlay.activate(&mut doc)?;

    println!("\nTab through the document:");
    for _ in 0..8 {
        overlay.handle_key(&mut doc, &mut KeyboardEvent::new("Tab"));
    }

    println!("\nJump between headings:");
    for _ in 0..4 {
        overlay.handle_key(&mut doc, &mut KeyboardEvent::new("h"));
    }

    if let Some(panel) = overlay.panel() {
        println!("\nDescription panel:\n{}", panel.to_text());
    }
    if let Some(spotlight) = overlay.spotlight() {
        println!("\nSpotlight: {}", serde_json::to_string(spotlight)?);
    }

    overlay.deactivate(&mut doc)?;
    println!("\nOverlay deactivated");
    Ok(())
}
