use chrono::{Days, Local};
use tracing::info;

use crate::app::{AppContext, Result};
use crate::domain::NormalizedMovieRecord;
use crate::engine::Job;
use crate::highlights::highlights;
use crate::store::Store;

pub async fn collect_releases(
    ctx: &AppContext,
    countries: Vec<String>,
    providers: Vec<String>,
    days_backwards: u32,
    dry_run: bool,
) -> Result<()> {
    let job = Job::Releases {
        countries,
        providers,
        days_backwards,
    };
    let records = ctx.engine.run_with_chrome(&ctx.config.browser, &job).await?;
    info!("Collected {} releases", records.len());

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let summary = ctx.store.upsert_releases(&records)?;
    info!(
        "Upserted {} releases, {} were already stored",
        summary.inserted, summary.matched
    );
    Ok(())
}

pub async fn collect_top(
    ctx: &AppContext,
    countries: Vec<String>,
    providers: Vec<String>,
    dry_run: bool,
) -> Result<()> {
    let job = Job::Top {
        countries,
        providers,
    };
    let records = ctx.engine.run_with_chrome(&ctx.config.browser, &job).await?;

    if dry_run {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let count = ctx.store.add_top_releases(&records)?;
    info!("Stored {} top titles", count);
    Ok(())
}

pub fn show_highlights(ctx: &AppContext, days: u32, per_provider: usize) -> Result<()> {
    let today = Local::now().date_naive();
    let since = today.checked_sub_days(Days::new(u64::from(days))).unwrap_or(today);

    let records = ctx.store.get_releases_since(since)?;
    let ranked = highlights(&records, per_provider, ctx.config.engine.min_num_ratings);

    if ranked.is_empty() {
        println!("No highlights since {}", since);
        return Ok(());
    }

    for (provider, records) in ranked {
        println!("{}", provider);
        for record in records {
            println!("  {}", format_record(&record));
        }
    }
    Ok(())
}

pub fn list_releases(ctx: &AppContext) -> Result<()> {
    let records = ctx.store.get_all_releases()?;

    if records.is_empty() {
        println!("No releases");
        return Ok(());
    }

    for record in records {
        println!(
            "{} [{} / {}] {}",
            record.date_added,
            record.country,
            record.provider,
            format_record(&record)
        );
    }
    Ok(())
}

pub fn list_top(ctx: &AppContext, mark_sent: bool) -> Result<()> {
    let releases = ctx.store.get_unsent_top_releases()?;

    if releases.is_empty() {
        println!("No unsent top titles");
        return Ok(());
    }

    for release in &releases {
        println!(
            "{:>5} [{} / {}] {}",
            release.id,
            release.record.country,
            release.record.provider,
            format_record(&release.record)
        );
    }

    if mark_sent {
        let ids: Vec<i64> = releases.iter().map(|r| r.id).collect();
        let marked = ctx.store.mark_top_releases_sent(&ids)?;
        println!("Marked {} titles as sent", marked);
    }
    Ok(())
}

pub fn show_config(ctx: &AppContext) -> Result<()> {
    let rendered = ctx
        .config
        .to_toml()
        .map_err(|e| crate::app::ReelError::Config(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

/// One-line summary: name, year, score, rating volume, runtime and link.
pub fn format_record(record: &NormalizedMovieRecord) -> String {
    let year = record
        .release_year
        .map(|y| format!(" ({})", y))
        .unwrap_or_default();
    let score = match (record.external_rating_score, &record.num_ratings) {
        (Some(score), Some(count)) => format!("{:.1} ({})", score, count),
        (Some(score), None) => format!("{:.1}", score),
        _ => "-".to_string(),
    };
    let runtime = if record.runtime.is_empty() {
        "-"
    } else {
        record.runtime.as_str()
    };

    format!(
        "{}{} | {} | {} | {}",
        record.name, year, score, runtime, record.canonical_streaming_link
    )
}
