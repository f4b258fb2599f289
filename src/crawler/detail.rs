use std::collections::BTreeMap;

use tracing::debug;

use crate::app::Result;
use crate::crawler::{read_page, Session, SiteAdapter};
use crate::domain::{RawMovieRecord, ReleaseDate, TitleLink};

/// Open a title's detail page and read its fields.
///
/// Missing fragments only blank their own field; only a failed navigation
/// is an error.
pub async fn extract_details(
    session: &dyn Session,
    adapter: &dyn SiteAdapter,
    link: &str,
    date: ReleaseDate,
) -> Result<RawMovieRecord> {
    session.navigate(link).await?;

    let fields = read_page(session, |page| adapter.detail_fields(page)).await?;
    let record = RawMovieRecord::from_fields(date, fields);

    if !record.missing_fields.is_empty() {
        debug!(
            "Detail page {} is missing {:?}",
            link, record.missing_fields
        );
    }

    Ok(record)
}

/// Extract every discovered title, oldest date first, in rail order.
pub async fn extract_all(
    session: &dyn Session,
    adapter: &dyn SiteAdapter,
    timelines: &BTreeMap<ReleaseDate, Vec<TitleLink>>,
) -> Result<Vec<RawMovieRecord>> {
    let mut records = Vec::new();
    for (date, links) in timelines {
        for link in links {
            records.push(extract_details(session, adapter, link, *date).await?);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ReelError;
    use crate::crawler::testing::{detail_page, FakePage, FakeSession};
    use crate::crawler::{EngineConfig, JustWatchMarkup};
    use crate::domain::DetailField;
    use chrono::NaiveDate;

    const DUNE: &str = "https://www.justwatch.com/de/Film/dune";
    const HEAT: &str = "https://www.justwatch.com/de/Film/heat";

    fn adapter() -> JustWatchMarkup {
        JustWatchMarkup::from_config(&EngineConfig::default()).unwrap()
    }

    fn day() -> ReleaseDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    #[tokio::test]
    async fn test_extract_details() {
        let session = FakeSession::new().with_page(
            DUNE,
            FakePage::new(detail_page(
                "Dune",
                "2021",
                "8.0 (850k)",
                &[("Flatrate", "https://click.justwatch.com/a?r=netflix")],
            )),
        );

        let record = extract_details(&session, &adapter(), DUNE, day())
            .await
            .unwrap();

        assert_eq!(record.date_added, day());
        assert_eq!(record.name.trim(), "Dune");
        assert_eq!(record.release_year_text, "(2021)");
        assert_eq!(record.external_rating_text, "8.0 (850k)");
        assert_eq!(record.runtime_text, "2h 15min");
        assert_eq!(record.raw_streaming_links.len(), 1);
        assert!(record.missing_fields.is_empty());
    }

    #[tokio::test]
    async fn test_each_field_degrades_alone() {
        let full = detail_page(
            "Dune",
            "2021",
            "8.0 (850k)",
            &[("Flatrate", "https://click.justwatch.com/a?r=netflix")],
        );
        let removals: [(DetailField, &str, &str); 5] = [
            (DetailField::Name, "<h1> Dune </h1>", ""),
            (DetailField::ReleaseYear, "<span>(2021)</span>", ""),
            (
                DetailField::ExternalRatingLink,
                r#"<a href="https://www.imdb.com/title/tt0000001/?ref_=justwatch">8.0 (850k)</a>"#,
                "8.0 (850k)",
            ),
            (DetailField::Runtime, "<div>Laufzeit</div>", ""),
            (DetailField::StreamingLinks, "price-comparison--block", "other-block"),
        ];

        for (field, needle, replacement) in removals {
            let markup = full.replace(needle, replacement);
            let session = FakeSession::new().with_page(DUNE, FakePage::new(markup));
            let record = extract_details(&session, &adapter(), DUNE, day())
                .await
                .unwrap();

            assert_eq!(record.missing_fields, vec![field], "removing {}", field);
            let present = DetailField::ALL.iter().filter(|f| **f != field).count();
            let filled = [
                !record.name.is_empty(),
                !record.release_year_text.is_empty(),
                !record.external_rating_link.is_empty(),
                !record.external_rating_text.is_empty(),
                !record.runtime_text.is_empty(),
                !record.raw_streaming_links.is_empty(),
            ]
            .iter()
            .filter(|f| **f)
            .count();
            assert_eq!(filled, present, "removing {}", field);
        }
    }

    #[tokio::test]
    async fn test_navigation_failure_is_an_error() {
        let session = FakeSession::new().with_broken(DUNE);
        let err = extract_details(&session, &adapter(), DUNE, day())
            .await
            .unwrap_err();
        assert!(matches!(err, ReelError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_extract_all_keeps_order() {
        let session = FakeSession::new()
            .with_page(DUNE, FakePage::new(detail_page("Dune", "2021", "8.0", &[])))
            .with_page(HEAT, FakePage::new(detail_page("Heat", "1995", "8.3", &[])));

        let mut timelines = BTreeMap::new();
        timelines.insert(day(), vec![HEAT.to_string(), DUNE.to_string()]);

        let records = extract_all(&session, &adapter(), &timelines).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.trim().to_string()).collect();
        assert_eq!(names, vec!["Heat", "Dune"]);
        assert_eq!(session.visits(), vec![HEAT.to_string(), DUNE.to_string()]);
    }
}
