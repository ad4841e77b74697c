use std::fmt;

use nc_core::dates::query_year;
use nc_core::{Article, Config, Error, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::sources::{
    build_client, GdeltSource, GoogleNewsSource, NewsApiSource, Source, SourceMetadata,
    WikipediaSource,
};

type BoxedSource = Box<dyn Source>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPath {
    Historical,
    Current,
}

impl fmt::Display for FetchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchPath::Historical => "historical",
            FetchPath::Current => "current",
        })
    }
}

/// Articles from exactly one source, plus where they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    pub path: FetchPath,
    pub source: String,
    pub articles: Vec<Article>,
}

/// Picks the path for a query and walks its sources in fallback order.
pub struct SourceManager {
    historical: BoxedSource,
    current: Vec<BoxedSource>,
    historical_cutoff_year: i32,
}

impl SourceManager {
    /// Wikipedia for the historical path; Google News, GDELT, NewsAPI for
    /// the current path, sharing one HTTP client.
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_client(config.fetch_timeout)?;
        let current: Vec<BoxedSource> = vec![
            Box::new(GoogleNewsSource::new(client.clone(), config)),
            Box::new(GdeltSource::new(client.clone(), config)),
            Box::new(NewsApiSource::new(client.clone(), config)),
        ];
        Ok(Self::with_sources(
            Box::new(WikipediaSource::new(client)),
            current,
            config.historical_cutoff_year,
        ))
    }

    pub fn with_sources(
        historical: BoxedSource,
        current: Vec<BoxedSource>,
        historical_cutoff_year: i32,
    ) -> Self {
        Self {
            historical,
            current,
            historical_cutoff_year,
        }
    }

    pub fn path_for(&self, query: &str) -> FetchPath {
        match query_year(query) {
            Some(year) if year <= self.historical_cutoff_year => FetchPath::Historical,
            _ => FetchPath::Current,
        }
    }

    /// Sources in the order they are tried, historical first.
    pub fn list(&self) -> Vec<SourceMetadata> {
        std::iter::once(&self.historical)
            .chain(self.current.iter())
            .map(|s| s.source_metadata())
            .collect()
    }

    pub fn source_by_name(&self, name: &str) -> Option<&dyn Source> {
        let name = name.to_lowercase();
        std::iter::once(&self.historical)
            .chain(self.current.iter())
            .find(|s| s.cli_names().contains(&name.as_str()))
            .map(|s| &**s)
    }

    pub async fn fetch(&self, query: &str) -> Result<FetchResult> {
        match self.path_for(query) {
            FetchPath::Historical => self.fetch_historical(query).await,
            FetchPath::Current => self.fetch_current(query).await,
        }
    }

    /// Single source, no fallback: its failure fails the request.
    async fn fetch_historical(&self, query: &str) -> Result<FetchResult> {
        let meta = self.historical.source_metadata();
        info!("🏛️ Historical query, using {}", meta.name);

        let articles = self
            .historical
            .fetch(query, self.historical.max_results())
            .await
            .map_err(|e| Error::HistoricalFetchFailed(format!("{}: {}", meta.name, e)))?;
        if articles.is_empty() {
            return Err(Error::NoArticlesFound {
                query: query.to_string(),
            });
        }

        Ok(FetchResult {
            path: FetchPath::Historical,
            source: meta.name,
            articles,
        })
    }

    /// First source with a non-empty answer wins; results are never merged.
    async fn fetch_current(&self, query: &str) -> Result<FetchResult> {
        for source in &self.current {
            let meta = source.source_metadata();
            info!("🔎 Trying {}", meta.name);
            let articles = match source.fetch(query, source.max_results()).await {
                Ok(articles) => articles,
                Err(e) => {
                    warn!("{} failed: {}", meta.name, e);
                    Vec::new()
                }
            };
            if !articles.is_empty() {
                info!("✅ {} articles from {}", articles.len(), meta.name);
                return Ok(FetchResult {
                    path: FetchPath::Current,
                    source: meta.name,
                    articles,
                });
            }
            info!("{} returned nothing, falling back", meta.name);
        }

        Err(Error::NoArticlesFound {
            query: query.to_string(),
        })
    }
}
