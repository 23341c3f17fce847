pub mod client;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

pub use client::HttpContentClient;

pub const FIRST_PAGE: i64 = 1;
pub const LAST_PAGE: i64 = 604;

/// Collection name used when the provider omits one ("unknown").
pub const UNKNOWN_COLLECTION: &str = "غير معروف";
/// Body used when a hadith record has no Arabic text ("text unavailable").
pub const MISSING_HADITH_TEXT: &str = "نص الحديث غير متوفر";

/// Failure fetching or decoding provider content.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("collection '{0}' returned no hadiths")]
    EmptyCollection(String),
}

/// Hadith collections served by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HadithBook {
    Bukhari,
    Muslim,
    AbuDawud,
    Tirmidzi,
    Nasai,
    IbnuMajah,
}

impl HadithBook {
    pub const ALL: [HadithBook; 6] = [
        HadithBook::Bukhari,
        HadithBook::Muslim,
        HadithBook::AbuDawud,
        HadithBook::Tirmidzi,
        HadithBook::Nasai,
        HadithBook::IbnuMajah,
    ];

    /// Provider path segment for this collection
    pub fn slug(self) -> &'static str {
        match self {
            HadithBook::Bukhari => "bukhari",
            HadithBook::Muslim => "muslim",
            HadithBook::AbuDawud => "abudawud",
            HadithBook::Tirmidzi => "tirmidzi",
            HadithBook::Nasai => "nasai",
            HadithBook::IbnuMajah => "ibnumajah",
        }
    }

    /// Pick a collection uniformly at random
    pub fn choose<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl std::fmt::Display for HadithBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// A single hadith ready to be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hadith {
    /// Collection name as reported by the provider
    pub collection: String,
    pub text: String,
}

/// Page number outside the mushaf.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("page {0} is outside 1..=604")]
pub struct PageOutOfRange(pub i64);

/// A validated mushaf page number in `1..=604`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PageNumber(u16);

impl PageNumber {
    pub fn new(page: i64) -> Result<Self, PageOutOfRange> {
        if (FIRST_PAGE..=LAST_PAGE).contains(&page) {
            Ok(Self(page as u16))
        } else {
            Err(PageOutOfRange(page))
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for PageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of the content the bot relays.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// One hadith from a randomly chosen collection
    async fn random_hadith(&self) -> Result<Hadith, ContentError>;

    /// Raw image bytes for a mushaf page
    async fn page_image(&self, page: PageNumber) -> Result<Vec<u8>, ContentError>;
}
