//! Date-seeded pick from the daily rotation pool.
//!
//! The seed is the sum of the byte values of the ISO calendar day
//! (`YYYY-MM-DD`), and the pick is `pool[seed % pool.len()]`. Every caller
//! holding the same pool sees the same item on the same day. Callers
//! normalize time zones before passing the date in.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::models::ContentItem;

pub fn canonical_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn date_seed(date: NaiveDate) -> u64 {
    canonical_day(date).bytes().map(u64::from).sum()
}

/// `pool` is expected pre-filtered to active items and sorted by display
/// order. An empty pool is rejected; callers suppress the feature instead.
pub fn select_daily(pool: &[ContentItem], date: NaiveDate) -> CoreResult<&ContentItem> {
    if pool.is_empty() {
        return Err(CoreError::InvalidArgument(
            "daily selection needs at least one item".to_string(),
        ));
    }

    let seed = date_seed(date);
    let index = (seed % pool.len() as u64) as usize;
    debug!(%date, seed, index, pool = pool.len(), "selected daily item");
    Ok(&pool[index])
}
