//! Plain-text rendering for terminal output.

use std::fmt::Write;

use nc_core::{Article, TimelineBucket, TimelineEvent};
use nc_sources::{Report, SourceMetadata};

const SNIPPET_CHARS: usize = 200;

fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(SNIPPET_CHARS).collect();
    if text.chars().count() > SNIPPET_CHARS {
        out.push('…');
    }
    out
}

pub fn articles(articles: &[Article]) -> String {
    let mut out = String::new();
    for (i, a) in articles.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, a.title);
        let _ = writeln!(out, "   {} | {} | {}", a.source, a.published_at, a.url);
        if !a.content.is_empty() {
            let _ = writeln!(out, "   {}", snippet(&a.content));
        }
    }
    if articles.is_empty() {
        out.push_str("No articles.\n");
    }
    out
}

pub fn milestones(timeline: &[TimelineBucket]) -> String {
    let mut out = String::new();
    for bucket in timeline {
        let _ = writeln!(out, "📅 {}", bucket.date);
        for c in &bucket.events {
            let _ = writeln!(out, "   • {} ({})", c.sentence, c.source);
        }
    }
    if timeline.is_empty() {
        out.push_str("No milestone sentences found.\n");
    }
    out
}

fn events(timeline: &[TimelineBucket<TimelineEvent>]) -> String {
    let mut out = String::new();
    for bucket in timeline {
        let _ = writeln!(out, "📅 {}", bucket.date);
        for e in &bucket.events {
            let _ = writeln!(out, "   • {}", e.event);
        }
    }
    out
}

pub fn sources(sources: &[SourceMetadata]) -> String {
    let mut out = String::new();
    for (i, s) in sources.iter().enumerate() {
        let _ = writeln!(out, "{}. {} [{}] {}", i + 1, s.name, s.kind, s.url);
    }
    out
}

pub fn report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📰 {}", report.query);
    let _ = writeln!(
        out,
        "{} articles from {} ({} path)\n",
        report.articles.len(),
        report.source,
        report.path
    );

    out.push_str("## 🧠 Timeline\n");
    if report.timeline.is_empty() {
        out.push_str("(no generated timeline; heuristic milestones below)\n");
        out.push_str(&milestones(&report.heuristic_timeline));
    } else {
        out.push_str(&events(&report.timeline));
    }

    let _ = writeln!(out, "\n## 📝 Summary\n{}\n", report.summary);

    out.push_str("## 🔍 Sources\n");
    for c in &report.credibility {
        let _ = writeln!(
            out,
            "   {:.2}  {} [{} / {}] {}",
            c.score, c.source, c.authenticity_label, c.bias_label, c.url
        );
    }
    let _ = writeln!(
        out,
        "\nOverall authenticity: {:.2} ({})\n",
        report.overall_score, report.confidence
    );

    if !report.consistency.is_empty() {
        out.push_str("## ⚖️ Consistency\n");
        for c in &report.consistency {
            let mark = if c.is_consistent { "✔" } else { "✘" };
            let _ = writeln!(out, "{} {} {} [{}]", mark, c.date, c.event, c.severity);
            for p in &c.agreement_points {
                let _ = writeln!(out, "     + {}", p);
            }
            for d in &c.discrepancies {
                let _ = writeln!(out, "     - {}", d);
            }
        }
    }

    if report.is_degraded() {
        out.push_str("\n⚠️ Low confidence: some sections used fallback values\n");
        for d in &report.degraded {
            let _ = writeln!(out, "   {}", d);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::timeline::assemble_timeline;
    use nc_core::MilestoneCandidate;

    #[test]
    fn test_articles_listing() {
        let text = articles(&[Article::new("Title", "x".repeat(300), "https://a", "A", "2023-01-01")]);
        assert!(text.starts_with("1. Title\n"));
        assert!(text.contains("A | 2023-01-01 | https://a"));
        assert!(text.contains('…'));
        assert_eq!(articles(&[]), "No articles.\n");
    }

    #[test]
    fn test_milestones_unknown_last() {
        let timeline = assemble_timeline(vec![
            MilestoneCandidate {
                sentence: "Later.".to_string(),
                published_at: "unknown".to_string(),
                source: "s".to_string(),
                url: "u".to_string(),
            },
            MilestoneCandidate {
                sentence: "Launched.".to_string(),
                published_at: "2023-07-14".to_string(),
                source: "s".to_string(),
                url: "u".to_string(),
            },
        ]);
        let text = milestones(&timeline);
        let launch = text.find("2023-07-14").unwrap();
        let unknown = text.find("unknown").unwrap();
        assert!(launch < unknown);
    }
}
