use crate::config::HttpConfig;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const ARTICLE_ROOTS: [&str; 3] = ["article", "main", "div.post-content"];
const SKIPPED_CONTAINERS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

/// Best-effort article extraction. `None` means nothing could be extracted.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &Url) -> Option<String>;
}

pub struct HttpContentExtractor {
    http: reqwest::Client,
}

impl HttpContentExtractor {
    pub fn new(http: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: http.client()?,
        })
    }

    async fn fetch(&self, url: &Url) -> Result<String, reqwest::Error> {
        self.http
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

#[async_trait]
impl ContentExtractor for HttpContentExtractor {
    async fn extract(&self, url: &Url) -> Option<String> {
        let html = match self.fetch(url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(%url, error = %err, "failed to fetch article");
                return None;
            }
        };
        let text = article_text(&html);
        debug!(%url, found = text.is_some(), "article extraction finished");
        text
    }
}

/// Paragraph text of the first `article`, `main` or `div.post-content` element, with
/// whitespace collapsed. Paragraphs nested in navigation, headers, footers, scripts or
/// styles are skipped.
pub fn article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let root = ARTICLE_ROOTS.iter().find_map(|selector| {
        Selector::parse(selector)
            .ok()
            .and_then(|sel| document.select(&sel).next())
    })?;

    let paragraph = Selector::parse("p").ok()?;
    let content = root
        .select(&paragraph)
        .filter(|p| !inside_skipped_container(*p))
        .map(|p| p.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .collect::<Vec<_>>()
        .join(" ");

    Some(content.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn inside_skipped_container(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| SKIPPED_CONTAINERS.contains(&ancestor.value().name()))
}
