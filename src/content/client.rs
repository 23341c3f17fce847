use std::time::Instant;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProvidersConfig;
use crate::content::{
    ContentError, ContentSource, Hadith, HadithBook, PageNumber, MISSING_HADITH_TEXT,
    UNKNOWN_COLLECTION,
};

#[derive(Debug, Deserialize)]
struct HadithEnvelope {
    data: Option<HadithCollection>,
}

#[derive(Debug, Deserialize)]
struct HadithCollection {
    name: Option<String>,
    hadiths: Option<Vec<HadithRecord>>,
}

#[derive(Debug, Deserialize)]
struct HadithRecord {
    arab: Option<String>,
}

/// HTTP client for the hadith API and the mushaf page-image service.
pub struct HttpContentClient {
    client: reqwest::Client,
    config: ProvidersConfig,
}

impl HttpContentClient {
    pub fn new(config: ProvidersConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn hadith_url(&self, book: HadithBook) -> String {
        format!(
            "{}/books/{}?range={}",
            self.config.hadith_base_url.trim_end_matches('/'),
            book.slug(),
            self.config.hadith_range
        )
    }

    pub fn page_url(&self, page: PageNumber) -> String {
        format!(
            "{}/{}.png",
            self.config.page_image_base_url.trim_end_matches('/'),
            page
        )
    }

    /// Fetch one hadith from a specific collection
    pub async fn hadith_from(&self, book: HadithBook) -> Result<Hadith, ContentError> {
        let url = self.hadith_url(book);
        let response = self.get(&url).await?;
        let body = response.text().await.map_err(|source| ContentError::Request {
            url: url.clone(),
            source,
        })?;

        let envelope: HadithEnvelope =
            serde_json::from_str(&body).map_err(|e| ContentError::Malformed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        select_hadith(&url, book, envelope, &mut rand::thread_rng())
    }

    /// GET `url`, mapping transport failures and non-success statuses.
    async fn get(&self, url: &str) -> Result<reqwest::Response, ContentError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ContentError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        debug!(
            "GET {} -> {} in {}ms",
            url,
            status,
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            return Err(ContentError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

fn select_hadith<R: Rng>(
    url: &str,
    book: HadithBook,
    envelope: HadithEnvelope,
    rng: &mut R,
) -> Result<Hadith, ContentError> {
    let malformed = |reason: &str| ContentError::Malformed {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let collection = envelope.data.ok_or_else(|| malformed("missing 'data'"))?;
    let mut hadiths = collection
        .hadiths
        .ok_or_else(|| malformed("missing 'data.hadiths'"))?;

    if hadiths.is_empty() {
        return Err(ContentError::EmptyCollection(book.slug().to_string()));
    }

    let record = hadiths.swap_remove(rng.gen_range(0..hadiths.len()));
    Ok(Hadith {
        collection: collection
            .name
            .unwrap_or_else(|| UNKNOWN_COLLECTION.to_string()),
        text: record
            .arab
            .unwrap_or_else(|| MISSING_HADITH_TEXT.to_string()),
    })
}

#[async_trait]
impl ContentSource for HttpContentClient {
    async fn random_hadith(&self) -> Result<Hadith, ContentError> {
        let book = HadithBook::choose(&mut rand::thread_rng());
        debug!("Fetching random hadith from {}", book);
        self.hadith_from(book).await
    }

    async fn page_image(&self, page: PageNumber) -> Result<Vec<u8>, ContentError> {
        let url = self.page_url(page);
        let response = self.get(&url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ContentError::Request {
                url: url.clone(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}
