use chrono::{DateTime, Utc};
use core_types::{Metric, Stats};
use serde::Deserialize;

// Field names follow our own camelCase convention; aliases accept the names commonly
// used by third-party account-tracking feeds.

/// The raw performance figures returned for one external account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsResponse {
    #[serde(alias = "gain", alias = "roi")]
    pub roi_pct: Option<Metric>,
    #[serde(alias = "drawdown")]
    pub max_drawdown_pct: Option<Metric>,
    pub balance: Option<Metric>,
    pub equity: Option<Metric>,
    #[serde(alias = "winRate")]
    pub win_rate_pct: Option<Metric>,
    pub profit_factor: Option<Metric>,
    #[serde(alias = "trades")]
    pub total_trades: Option<Metric>,
}

impl StatsResponse {
    /// Converts the feed record into stored stats, stamped with `updated_at`.
    pub fn into_stats(self, updated_at: DateTime<Utc>) -> Stats {
        Stats {
            roi_pct: self.roi_pct,
            max_drawdown_pct: self.max_drawdown_pct,
            balance: self.balance,
            equity: self.equity,
            win_rate_pct: self.win_rate_pct,
            profit_factor: self.profit_factor,
            total_trades: self.total_trades,
            updated_at: Some(updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_feed_aliases_and_mixed_types() {
        let response: StatsResponse = serde_json::from_str(
            r#"{"gain": "12.4", "drawdown": 3.1, "balance": 10500, "winRate": "61", "trades": 48, "unknown": 1}"#,
        )
        .unwrap();

        assert_eq!(response.roi_pct, Some(Metric::from("12.4")));
        assert_eq!(response.max_drawdown_pct, Some(Metric::Number(3.1)));
        assert_eq!(response.win_rate_pct, Some(Metric::from("61")));
        assert_eq!(response.total_trades, Some(Metric::Number(48.0)));
        assert_eq!(response.equity, None);
    }

    #[test]
    fn into_stats_replaces_every_field_and_stamps_time() {
        let now = Utc::now();
        let stats = StatsResponse {
            equity: Some(Metric::Number(99.0)),
            ..Default::default()
        }
        .into_stats(now);

        assert_eq!(stats.equity, Some(Metric::Number(99.0)));
        assert_eq!(stats.roi_pct, None);
        assert_eq!(stats.updated_at, Some(now));
    }
}
