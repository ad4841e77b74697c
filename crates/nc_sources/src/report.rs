use nc_core::annotate::annotate_articles;
use nc_core::milestones::extract_milestones;
use nc_core::normalize::normalize_articles;
use nc_core::relevance::filter_relevant;
use nc_core::timeline::assemble_timeline;
use nc_core::{Article, EntityAnnotator, HeuristicAnnotator, Result, TimelineBucket, TimelineEvent};
use nc_inference::credibility::{ArticleCredibility, Confidence};
use nc_inference::{EventConsistency, ServiceOutcome, Services};
use serde::Serialize;
use tracing::{info, warn};

use crate::manager::{FetchPath, FetchResult, SourceManager};

/// Everything produced for one query. `degraded` names each section that
/// fell back to a default, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: String,
    pub path: FetchPath,
    pub source: String,
    pub articles: Vec<Article>,
    pub heuristic_timeline: Vec<TimelineBucket>,
    pub timeline: Vec<TimelineBucket<TimelineEvent>>,
    pub summary: String,
    pub credibility: Vec<ArticleCredibility>,
    pub overall_score: f64,
    pub confidence: Confidence,
    pub consistency: Vec<EventConsistency>,
    pub degraded: Vec<String>,
}

impl Report {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Fetch, normalize, annotate and relevance-filter: every stage before the
/// generative services.
pub async fn gather(
    manager: &SourceManager,
    annotator: &dyn EntityAnnotator,
    query: &str,
) -> Result<FetchResult> {
    let fetched = manager.fetch(query).await?;
    let mut articles = normalize_articles(fetched.articles);
    annotate_articles(annotator, &mut articles);
    let articles = filter_relevant(query, articles);

    Ok(FetchResult { articles, ..fetched })
}

pub struct ReportBuilder {
    manager: SourceManager,
    annotator: Box<dyn EntityAnnotator>,
    services: Services,
}

impl ReportBuilder {
    pub fn new(manager: SourceManager, services: Services) -> Self {
        Self {
            manager,
            annotator: Box::new(HeuristicAnnotator::new()),
            services,
        }
    }

    pub fn with_annotator(mut self, annotator: Box<dyn EntityAnnotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub async fn build(&self, query: &str) -> Result<Report> {
        let FetchResult {
            path,
            source,
            articles,
        } = gather(&self.manager, &*self.annotator, query).await?;
        info!("📰 {} articles from {} ({} path)", articles.len(), source, path);

        let heuristic_timeline = assemble_timeline(extract_milestones(&articles));
        let mut degraded = Vec::new();

        let summary = note(
            "summary",
            self.services.summarizer.summarize(&articles, query).await,
            &mut degraded,
        );
        let credibility = note(
            "credibility",
            self.services.scorer.score(&articles).await,
            &mut degraded,
        );
        let consistency = note(
            "consistency",
            self.services.analyzer.check(&summary.timeline, &articles).await,
            &mut degraded,
        );

        info!("✅ Report ready for {:?}", query);
        Ok(Report {
            query: query.to_string(),
            path,
            source,
            articles,
            heuristic_timeline,
            timeline: assemble_timeline(summary.timeline),
            summary: summary.summary,
            credibility: credibility.articles,
            overall_score: credibility.overall_score,
            confidence: credibility.confidence,
            consistency,
            degraded,
        })
    }
}

fn note<T>(section: &str, outcome: ServiceOutcome<T>, degraded: &mut Vec<String>) -> T {
    match outcome {
        ServiceOutcome::Success(value) => value,
        ServiceOutcome::Fallback { value, reason } => {
            warn!("⚠️ {} degraded: {}", section, reason);
            degraded.push(format!("{}: {}", section, reason));
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::tests::{Canned, MockSource};
    use crate::sources::{Source, SourceKind};
    use nc_core::dates::BucketDate;
    use nc_core::{Config, Error, RetryPolicy, UNKNOWN_DATE};
    use nc_inference::models::{DummyModel, ScriptedReply};
    use nc_inference::Severity;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> Config {
        Config {
            retry: RetryPolicy {
                initial_wait: Duration::ZERO,
                ..RetryPolicy::default()
            },
            ..Config::default()
        }
    }

    fn manager(news: Vec<Article>) -> SourceManager {
        let (wiki, _) = MockSource::new("wikipedia", SourceKind::Historical, Canned::Fail);
        let (google, _) = MockSource::new("google", SourceKind::News, Canned::Articles(news));
        let current: Vec<Box<dyn Source>> = vec![Box::new(google)];
        SourceManager::with_sources(Box::new(wiki), current, 2021)
    }

    fn news() -> Vec<Article> {
        vec![
            Article::new(
                "Chandrayaan-3 lands",
                "<p>ISRO confirmed the landing on the Moon.</p> Crowds cheered.",
                "https://news.test/landing",
                "The Hindu",
                "Wed, 23 Aug 2023 12:34:00 GMT",
            ),
            Article::new(
                "Chandrayaan-3 launch",
                "The rocket will launch  from Sriharikota.",
                "https://news.test/launch",
                "NDTV",
                "20230714093000",
            ),
            Article::new(
                "Cricket scores",
                "Rain stopped play.",
                "https://news.test/cricket",
                "ESPN",
                "garbage",
            ),
        ]
    }

    #[tokio::test]
    async fn test_gather_normalizes_annotates_and_filters() {
        let manager = manager(news());
        let fetched = gather(&manager, &HeuristicAnnotator::new(), "Chandrayaan-3").await.unwrap();
        assert_eq!(fetched.source, "google");
        assert_eq!(fetched.articles.len(), 2);
        let landing = &fetched.articles[0];
        assert_eq!(landing.content, "ISRO confirmed the landing on the Moon. Crowds cheered.");
        assert_eq!(landing.published_at, "2023-08-23T12:34:00Z");
        assert!(landing.entities.iter().any(|e| e.text == "ISRO"));
        assert_eq!(fetched.articles[1].published_at, "2023-07-14");
    }

    #[tokio::test]
    async fn test_build_full_report() {
        let model = Arc::new(DummyModel::scripted([
            ScriptedReply::Text(
                r#"{"timeline": [{"date": "2023-08-23", "event": "Lander touched down."},
                                 {"date": "2023-07-14", "event": "Launch."}],
                    "summary": "Launched in July, landed in August."}"#
                    .to_string(),
            ),
            ScriptedReply::Text(
                r#"[{"url": "https://news.test/landing", "credibility_score": 0.9}]"#.to_string(),
            ),
            ScriptedReply::Text(
                r#"[{"is_consistent": true, "severity": "low"}, {"is_consistent": false, "severity": "high"}]"#
                    .to_string(),
            ),
        ]));
        let builder = ReportBuilder::new(manager(news()), Services::new(model.clone(), &config()));
        let report = builder.build("Chandrayaan-3").await.unwrap();

        assert_eq!(report.path, FetchPath::Current);
        assert_eq!(report.articles.len(), 2);
        assert!(!report.is_degraded());
        assert_eq!(model.calls(), 3);

        let heuristic_dates: Vec<_> = report.heuristic_timeline.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(heuristic_dates, vec!["2023-07-14", "2023-08-23"]);

        assert_eq!(report.timeline[0].events[0].event, "Launch.");
        assert_eq!(report.summary, "Launched in July, landed in August.");
        assert_eq!(report.credibility[1].score, 0.6);
        assert!((report.overall_score - 0.75).abs() < 1e-9);
        assert_eq!(report.consistency[0].event, "Lander touched down.");
        assert_eq!(report.consistency[1].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_build_degrades_instead_of_failing() {
        let model = Arc::new(DummyModel::new());
        let builder = ReportBuilder::new(manager(news()), Services::new(model.clone(), &config()));
        let report = builder.build("Chandrayaan-3").await.unwrap();

        assert_eq!(report.summary, nc_inference::SUMMARY_UNAVAILABLE);
        assert!(report.timeline.is_empty());
        assert!(report.consistency.is_empty());
        assert_eq!(report.overall_score, 0.6);
        assert_eq!(report.degraded.len(), 2);
        assert!(report.degraded[0].starts_with("summary:"));
        // no timeline, so the consistency service is never asked
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_build_without_articles_fails() {
        let builder = ReportBuilder::new(
            manager(Vec::new()),
            Services::new(Arc::new(DummyModel::new()), &config()),
        );
        let err = builder.build("Chandrayaan-3").await.unwrap_err();
        assert!(matches!(err, Error::NoArticlesFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_dates_bucket_last() {
        let mut articles = news();
        articles[0].published_at = "sometime".to_string();
        let manager = manager(articles);
        let fetched = gather(&manager, &HeuristicAnnotator::new(), "Chandrayaan-3").await.unwrap();
        assert_eq!(fetched.articles[0].published_at, UNKNOWN_DATE);
        let timeline = assemble_timeline(extract_milestones(&fetched.articles));
        assert_eq!(timeline.last().map(|b| b.date), Some(BucketDate::Unknown));
    }
}
