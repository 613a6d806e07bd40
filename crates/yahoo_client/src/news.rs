//! News envelope parsing.

use serde::Deserialize;

use common::{Error, NewsItem};

#[derive(Debug, Deserialize)]
pub struct NewsEnvelope {
    #[serde(default)]
    pub news: Vec<RawNewsItem>,
}

#[derive(Debug, Deserialize)]
pub struct RawNewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub link: String,
    /// Epoch seconds.
    #[serde(rename = "providerPublishTime", default)]
    pub provider_publish_time: i64,
}

/// Parse a news envelope, keeping at most `limit` titled items.
pub fn parse_news(raw: &str, limit: usize) -> Result<Vec<NewsItem>, Error> {
    let envelope: NewsEnvelope = serde_json::from_str(raw)?;

    let mut items: Vec<NewsItem> = envelope
        .news
        .into_iter()
        .filter(|n| !n.title.is_empty())
        .map(|n| NewsItem {
            title: n.title,
            publisher: n.publisher,
            link: n.link,
            published_at: n.provider_publish_time * 1000,
        })
        .collect();

    items.truncate(limit);
    Ok(items)
}
