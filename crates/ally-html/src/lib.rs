//! ALLYINFO HTML Loader
//!
//! HTML5 parsing built on html5ever, producing `ally_dom::Document`s.

mod parser;

pub use parser::HtmlParser;

use ally_dom::Document;

/// Parse an HTML string into a document at `about:blank`
pub fn parse(html: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string into a document at `url`
pub fn parse_with_url(html: &str, url: &str) -> Result<Document, HtmlError> {
    HtmlParser::new().parse_with_url(html, url)
}

/// Loader error
#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    #[error("Failed to read HTML input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to build DOM: {0}")]
    Dom(#[from] ally_dom::DomError),
}
