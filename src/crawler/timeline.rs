use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::crawler::{read_page, Session, SiteAdapter, StructuralPath, TimelineSection};
use crate::domain::{ReleaseDate, TitleLink};

/// Collect title links from every rail on the current page whose date is
/// in `target_dates`.
///
/// Dates without a rail are simply absent from the result.
pub async fn discover_timelines(
    session: &dyn Session,
    adapter: &dyn SiteAdapter,
    target_dates: &BTreeSet<ReleaseDate>,
    scroll_step: f64,
) -> Result<BTreeMap<ReleaseDate, Vec<TitleLink>>> {
    let sections = read_page(session, |page| adapter.timeline_sections(page)).await?;
    let mut timelines = BTreeMap::new();

    for section in sections {
        let Some(date) = section.date else {
            continue;
        };
        if !target_dates.contains(&date) || timelines.contains_key(&date) {
            continue;
        }

        let links = collect_rail(session, adapter, date, section, scroll_step).await?;
        info!("Found {} titles added on {}", links.len(), date);
        timelines.insert(date, links);
    }

    Ok(timelines)
}

/// Scroll one rail until it holds as many items as its header advertises.
///
/// Items with a malformed anchor count as covered, and the number of
/// gestures never exceeds the advertised count.
async fn collect_rail(
    session: &dyn Session,
    adapter: &dyn SiteAdapter,
    date: ReleaseDate,
    section: TimelineSection,
    scroll_step: f64,
) -> Result<Vec<TitleLink>> {
    let advertised = section.advertised;
    let max_scrolls = advertised.max(1);
    let scroller = section.scroller.clone();
    let mut current = section;
    let mut scrolls = 0;

    while current.items.len() < advertised {
        if scrolls >= max_scrolls {
            warn!(
                "Rail for {} still shows {} of {} titles after {} scrolls",
                date,
                current.items.len(),
                advertised,
                scrolls
            );
            break;
        }

        let anchor = current
            .items
            .last()
            .map(|item| item.path.clone())
            .or_else(|| scroller.clone());
        let Some(anchor) = anchor else {
            warn!("Rail for {} has no scrollable element", date);
            break;
        };

        if !session.scroll_by(&anchor, scroll_step, 0.0).await? {
            debug!("Scroll anchor {} went stale, re-anchoring at the rail", anchor);
            rescroll_from_rail(session, scroller.as_ref(), &anchor, scroll_step).await?;
        }
        scrolls += 1;

        let refreshed = read_page(session, |page| {
            adapter
                .timeline_sections(page)
                .into_iter()
                .find(|s| s.date == Some(date))
        })
        .await?;

        match refreshed {
            Some(section) => current = section,
            None => debug!("Rail for {} disappeared after scrolling", date),
        }
    }

    Ok(current.items.into_iter().filter_map(|item| item.link).collect())
}

async fn rescroll_from_rail(
    session: &dyn Session,
    scroller: Option<&StructuralPath>,
    stale: &StructuralPath,
    scroll_step: f64,
) -> Result<()> {
    if let Some(scroller) = scroller.filter(|s| *s != stale) {
        if session.find_element(scroller).await? {
            session.scroll_by(scroller, scroll_step, 0.0).await?;
        }
    }
    Ok(())
}
