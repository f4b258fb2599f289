//! Best recent releases per provider.

use std::collections::BTreeMap;

use crate::domain::NormalizedMovieRecord;

/// Top `per_provider` records by external score for every provider.
///
/// Only records with both a score and at least `min_num_ratings` ratings
/// take part. Ties keep their input order.
pub fn highlights(
    records: &[NormalizedMovieRecord],
    per_provider: usize,
    min_num_ratings: u64,
) -> BTreeMap<String, Vec<NormalizedMovieRecord>> {
    let mut by_provider: BTreeMap<String, Vec<&NormalizedMovieRecord>> = BTreeMap::new();

    for record in records {
        if record.external_rating_score.is_none() || record.num_ratings.is_none() {
            continue;
        }
        if record.popularity() < min_num_ratings {
            continue;
        }
        by_provider
            .entry(record.provider.clone())
            .or_default()
            .push(record);
    }

    by_provider
        .into_iter()
        .map(|(provider, mut candidates)| {
            candidates.sort_by(|a, b| by_score(b).total_cmp(&by_score(a)));
            let top = candidates
                .into_iter()
                .take(per_provider)
                .cloned()
                .collect();
            (provider, top)
        })
        .collect()
}

fn by_score(record: &NormalizedMovieRecord) -> f64 {
    record.external_rating_score.unwrap_or(f64::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(name: &str, provider: &str, score: Option<f64>, ratings: Option<&str>) -> NormalizedMovieRecord {
        NormalizedMovieRecord {
            date_added: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            name: name.into(),
            release_year: Some(2020),
            external_rating_link: String::new(),
            external_rating_score: score,
            num_ratings: ratings.map(String::from),
            runtime: String::new(),
            canonical_streaming_link: String::new(),
            provider: provider.into(),
            country: "Germany".into(),
        }
    }

    #[test]
    fn test_top_n_per_provider_by_score() {
        let records = vec![
            record("a", "Netflix", Some(7.0), Some("20k")),
            record("b", "Netflix", Some(8.5), Some("300k")),
            record("c", "Netflix", Some(8.0), Some("1.2m")),
            record("d", "Netflix", Some(6.0), Some("50k")),
            record("e", "Disney Plus", Some(7.7), Some("90k")),
        ];

        let ranked = highlights(&records, 2, 10_000);

        let netflix: Vec<_> = ranked["Netflix"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(netflix, vec!["b", "c"]);
        assert_eq!(ranked["Disney Plus"].len(), 1);
    }

    #[test]
    fn test_requires_score_and_enough_ratings() {
        let records = vec![
            record("obscure", "Netflix", Some(9.5), Some("900")),
            record("unscored", "Netflix", None, Some("500k")),
            record("uncounted", "Netflix", Some(9.0), None),
            record("ok", "Netflix", Some(6.1), Some("10k")),
        ];

        let ranked = highlights(&records, 3, 10_000);

        let names: Vec<_> = ranked["Netflix"].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ok"]);
    }

    #[test]
    fn test_no_candidates_no_providers() {
        let ranked = highlights(&[record("a", "Netflix", None, None)], 3, 10_000);
        assert!(ranked.is_empty());
    }
}
