//! End-to-end refresh against a mock upstream

use async_trait::async_trait;
use httpmock::prelude::*;

use top10_core::{ContentType, EntityKind, ResolvedEntity};
use top10_services::{CatalogPipeline, CatalogStore, PipelineConfig};
use top10_sources::IdentityResolver;

/// Resolves odd-numbered titles only
struct OddTitles;

#[async_trait]
impl IdentityResolver for OddTitles {
    async fn resolve(&self, title: &str, expected: EntityKind) -> ResolvedEntity {
        let number: u32 = title.trim_start_matches('T').parse().unwrap_or(0);
        if number % 2 == 1 {
            ResolvedEntity::resolved(expected, (1000 + number).to_string(), Some(format!("/t{number}.jpg")))
        } else {
            ResolvedEntity::unresolved()
        }
    }
}

fn feed() -> String {
    let mut out = String::from("country_name\tweek\tcategory\tweekly_rank\tshow_title\n");
    for rank in (1..=12).rev() {
        out.push_str(&format!("X\t2025-06-01\tTV (English)\t{rank}\tOld{rank}\n"));
    }
    for rank in (1..=12).rev() {
        out.push_str(&format!("X\t2025-06-08\tTV (English)\t{rank}\tT{rank}\n"));
    }
    out.push_str("Y\t2025-06-08\tTV (English)\t1\tOther Region\n");
    out
}

#[tokio::test]
async fn test_refresh_writes_latest_top_ten() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/all-weeks-countries.tsv");
            then.status(200).body(feed());
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        region: "X".to_string(),
        category: "TV".to_string(),
        tabular_urls: vec![server.url("/all-weeks-countries.tsv")],
        html_urls: Vec::new(),
        cache_path: dir.path().join("catalog.json"),
        ..PipelineConfig::default()
    };
    let store = CatalogStore::new(&config.cache_path);

    let document = CatalogPipeline::from_config(&config)
        .unwrap()
        .with_resolver(Box::new(OddTitles))
        .refresh(&store)
        .await
        .unwrap();

    assert_eq!(document.metas.len(), 10);
    let names: Vec<_> = document.metas.iter().map(|r| r.name.as_str()).collect();
    let expected: Vec<String> = (1..=10).map(|i| format!("T{i}")).collect();
    assert_eq!(names, expected);

    for (i, record) in document.metas.iter().enumerate() {
        let rank = i + 1;
        assert_eq!(record.content_type, ContentType::Series);
        if rank % 2 == 1 {
            assert_eq!(record.id, format!("tmdb:tv:{}", 1000 + rank));
            assert_eq!(
                record.poster.as_deref(),
                Some(format!("https://image.tmdb.org/t/p/w500/t{rank}.jpg").as_str())
            );
        } else {
            assert_eq!(record.id, format!("fallback-{rank}"));
            assert!(record.poster.is_none());
        }
        assert!(record.description.starts_with(&format!("#{rank} in ")));
        assert!(record.description.ends_with("(week of 2025-06-08)"));
    }

    assert_eq!(store.load().unwrap(), Some(document));
}
