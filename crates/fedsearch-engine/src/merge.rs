//! Merging per-space results into one ranked response.

use std::cmp::Ordering;
use std::collections::HashSet;

use fedsearch_types::{Match, SearchResponse};
use tracing::debug;

use crate::error::EngineError;
use crate::executor::SpaceResults;
use crate::translate::translate;

/// Sort key for a score; NaN ranks below everything.
fn rank(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

fn by_score_desc(a: &Match, b: &Match) -> Ordering {
    rank(b.score).total_cmp(&rank(a.score))
}

/// Merge every space's results and return the first page.
///
/// `page_size` 0 returns all matches.
pub fn merge(results: Vec<SpaceResults>, page_size: u32) -> Result<SearchResponse, EngineError> {
    merge_page(results, page_size, 0)
}

/// Merge every space's results and return the page starting at `offset`.
///
/// Failed spaces are skipped unless all of a non-empty scope failed. Matches
/// are rebased, ranked by descending score (ties keep scope order), and
/// deduplicated by entity id keeping the best-ranked copy. The total is the
/// sum reported by the successful spaces and ignores paging.
pub fn merge_page(
    results: Vec<SpaceResults>,
    page_size: u32,
    offset: usize,
) -> Result<SearchResponse, EngineError> {
    let failed = results.iter().filter(|r| !r.is_success()).count();
    if !results.is_empty() && failed == results.len() {
        return Err(EngineError::AllBackendsFailed { failed });
    }

    let mut total_matches = 0u64;
    let mut failed_spaces = Vec::with_capacity(failed);
    let mut ranked: Vec<Match> = Vec::new();

    for space_results in results {
        if !space_results.is_success() {
            failed_spaces.push(space_results.scope.space.root);
            continue;
        }
        total_matches += space_results.total_matches;
        let rebase = space_results.scope.rebase;
        ranked.extend(
            space_results
                .matches
                .into_iter()
                .map(|m| translate(m, rebase.as_ref())),
        );
    }

    // sort_by is stable, so equal scores keep scope order.
    ranked.sort_by(by_score_desc);

    let mut seen = HashSet::new();
    ranked.retain(|m| seen.insert(m.entity.id.clone()));

    let ranked_len = ranked.len();
    let (matches, next_page_token) = if page_size == 0 {
        (ranked, None)
    } else {
        let page: Vec<Match> = ranked
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        let next_offset = offset + page.len();
        let token = (next_offset < ranked_len).then(|| next_offset.to_string());
        (page, token)
    };

    debug!(
        ranked = ranked_len,
        returned = matches.len(),
        total_matches,
        failed,
        "Merged space results"
    );

    Ok(SearchResponse {
        total_matches,
        matches,
        next_page_token,
        failed_spaces,
    })
}
