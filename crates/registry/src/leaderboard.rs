use core_types::{coerce, Participant};
use database::ParticipantRepository;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;

/// Default number of entries on the public board.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 100;

/// One row of the public ranking. Numeric fields are already coerced: anything that was
/// not a number or numeric string is `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub token: String,
    pub display_name: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub roi_pct: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub win_rate_pct: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub profit_factor: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_trades: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub equity: Option<Decimal>,
}

impl From<&Participant> for LeaderboardEntry {
    fn from(p: &Participant) -> Self {
        Self {
            token: p.token.clone(),
            display_name: p.display_name.clone(),
            roi_pct: coerce(p.stats.roi_pct.as_ref()),
            win_rate_pct: coerce(p.stats.win_rate_pct.as_ref()),
            profit_factor: coerce(p.stats.profit_factor.as_ref()),
            total_trades: coerce(p.stats.total_trades.as_ref()),
            equity: coerce(p.stats.equity.as_ref()),
        }
    }
}

/// Ranks active participants by ROI.
#[derive(Debug, Clone)]
pub struct LeaderboardRanker {
    limit: usize,
}

impl Default for LeaderboardRanker {
    fn default() -> Self {
        Self::new(DEFAULT_LEADERBOARD_LIMIT)
    }
}

impl LeaderboardRanker {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Reads the store and ranks its current contents.
    pub fn build(&self, repo: &ParticipantRepository) -> Vec<LeaderboardEntry> {
        self.rank(&repo.list())
    }

    /// Filters to `ACTIVE`, sorts by ROI descending (absent last), truncates.
    ///
    /// The sort is stable, so equal ROIs keep the order in which `participants` listed them.
    pub fn rank(&self, participants: &[Participant]) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = participants
            .iter()
            .filter(|p| p.status.is_active())
            .map(LeaderboardEntry::from)
            .collect();

        entries.sort_by(|a, b| by_roi_descending(a.roi_pct, b.roi_pct));
        entries.truncate(self.limit);
        entries
    }
}

fn by_roi_descending(a: Option<Decimal>, b: Option<Decimal>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
