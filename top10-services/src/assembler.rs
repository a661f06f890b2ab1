//! Catalog record assembly
//!
//! Joins ranked titles with their resolved identities. Every ranked title
//! yields exactly one record, resolved or not.

use top10_core::{CatalogRecord, ContentType, Ranking, ResolvedEntity};

use crate::config::CatalogSettings;

/// How records are named and linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Prefix of resolved ids, e.g. `tmdb` in `tmdb:tv:1396`
    pub provider: String,
    /// Prefix of synthetic ids for unresolved titles
    pub fallback_prefix: String,
    /// Prepended to an artwork path fragment to form the poster URL
    pub image_base: String,
    pub catalog_name: String,
    pub content_type: ContentType,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self::for_catalog(&CatalogSettings::default())
    }
}

impl AssemblerConfig {
    pub fn for_catalog(settings: &CatalogSettings) -> Self {
        Self {
            provider: "tmdb".to_string(),
            fallback_prefix: "fallback".to_string(),
            image_base: "https://image.tmdb.org/t/p/w500".to_string(),
            catalog_name: settings.name.clone(),
            content_type: settings.content_type,
        }
    }
}

/// Build one record per ranked title, pairing titles and entities by position
///
/// A title without a matching entity is treated as unresolved.
pub fn assemble(
    ranking: &Ranking,
    entities: &[ResolvedEntity],
    config: &AssemblerConfig,
) -> Vec<CatalogRecord> {
    let unresolved = ResolvedEntity::unresolved();

    ranking
        .titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let entity = entities.get(i).unwrap_or(&unresolved);

            let (id, poster) = match (&entity.kind, &entity.external_id) {
                (Some(kind), Some(external_id)) => (
                    format!("{}:{}:{}", config.provider, kind, external_id),
                    entity
                        .artwork_ref
                        .as_ref()
                        .map(|artwork| format!("{}{}", config.image_base, artwork)),
                ),
                _ => (format!("{}-{}", config.fallback_prefix, title.rank), None),
            };

            CatalogRecord {
                id,
                content_type: config.content_type,
                name: title.title.clone(),
                poster,
                description: describe(title.rank, &config.catalog_name, ranking.period.as_deref()),
            }
        })
        .collect()
}

fn describe(rank: u32, catalog_name: &str, period: Option<&str>) -> String {
    match period {
        Some(period) => format!("#{} in {} this week (week of {})", rank, catalog_name, period),
        None => format!("#{} in {} this week", rank, catalog_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use top10_core::{EntityKind, RankedTitle};

    fn config() -> AssemblerConfig {
        AssemblerConfig {
            catalog_name: "Top 10 NL".to_string(),
            ..AssemblerConfig::default()
        }
    }

    fn ranking(titles: &[&str]) -> Ranking {
        Ranking::new(
            "feed",
            titles
                .iter()
                .enumerate()
                .map(|(i, t)| RankedTitle::new(i as u32 + 1, *t, "feed"))
                .collect(),
        )
    }

    #[test]
    fn test_resolved_record() {
        let entities = vec![ResolvedEntity::resolved(
            EntityKind::Tv,
            "1396",
            Some("/bb.jpg".to_string()),
        )];

        let records = assemble(&ranking(&["Breaking Bad"]), &entities, &config());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "tmdb:tv:1396");
        assert_eq!(
            records[0].poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/bb.jpg")
        );
        assert_eq!(records[0].content_type, ContentType::Series);
        assert_eq!(records[0].description, "#1 in Top 10 NL this week");
    }

    #[test]
    fn test_unresolved_titles_are_never_dropped() {
        let entities = vec![
            ResolvedEntity::unresolved(),
            ResolvedEntity::resolved(EntityKind::Movie, "27205", None),
        ];

        let records = assemble(&ranking(&["A", "B", "C"]), &entities, &config());

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["fallback-1", "tmdb:movie:27205", "fallback-3"]);
        assert!(records.iter().all(|r| r.poster.is_none()));
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_description_includes_known_period() {
        let ranking = ranking(&["A"]).with_period(Some("2025-06-08".to_string()));
        let records = assemble(&ranking, &[], &config());
        assert_eq!(
            records[0].description,
            "#1 in Top 10 NL this week (week of 2025-06-08)"
        );
    }
}
