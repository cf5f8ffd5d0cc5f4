use crate::enums::ParticipantStatus;
use crate::metric::Metric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Using `#[serde(rename_all = "camelCase")]` so the persisted document and the HTTP API
// share one set of field names.

/// A registered tournament/program participant. The `token` is the identity and the
/// only credential the participant ever holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub token: String,
    pub display_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx_binding: Option<FxBinding>,
    #[serde(default)]
    pub status: ParticipantStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ParticipantMeta>,
    #[serde(default)]
    pub stats: Stats,
}

impl Participant {
    /// Creates a freshly registered, still pending participant.
    pub fn new(token: impl Into<String>, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            display_name: display_name.into(),
            email: email.into(),
            fx_binding: None,
            status: ParticipantStatus::Pending,
            created_at: Utc::now(),
            meta: None,
            stats: Stats::default(),
        }
    }

    /// The external-source username, if one is linked and non-blank.
    pub fn fx_username(&self) -> Option<&str> {
        self.fx_binding
            .as_ref()
            .and_then(|binding| binding.username.as_deref())
            .map(str::trim)
            .filter(|username| !username.is_empty())
    }

    /// Links (or re-links) the external-source username.
    pub fn bind_username(&mut self, username: impl Into<String>) {
        self.fx_binding
            .get_or_insert_with(FxBinding::default)
            .username = Some(username.into());
    }
}

/// Identity of the participant on the external stats feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxBinding {
    #[serde(default)]
    pub username: Option<String>,
}

/// Free-form account details captured at registration. Nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantMeta {
    pub platform: Option<String>,
    pub broker: Option<String>,
    pub server: Option<String>,
    pub leverage: Option<Metric>,
    pub account_size: Option<Metric>,
    pub country: Option<String>,
}

/// The latest known performance figures for a participant, kept inline on the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub roi_pct: Option<Metric>,
    pub max_drawdown_pct: Option<Metric>,
    pub balance: Option<Metric>,
    pub equity: Option<Metric>,
    pub win_rate_pct: Option<Metric>,
    pub profit_factor: Option<Metric>,
    pub total_trades: Option<Metric>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One immutable, timestamped performance measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub balance: Option<Metric>,
    #[serde(default)]
    pub equity: Option<Metric>,
    #[serde(default, rename = "closedPL")]
    pub closed_pl: Option<Metric>,
    #[serde(default, rename = "floatingPL")]
    pub floating_pl: Option<Metric>,
    #[serde(default)]
    pub total_trades: Option<Metric>,
    #[serde(default)]
    pub wins: Option<Metric>,
    #[serde(default)]
    pub losses: Option<Metric>,
    #[serde(default)]
    pub win_rate_pct: Option<Metric>,
    #[serde(default)]
    pub profit_factor: Option<Metric>,
    #[serde(default)]
    pub max_drawdown_pct: Option<Metric>,
    #[serde(default)]
    pub roi_pct: Option<Metric>,
}

impl Snapshot {
    /// An empty measurement taken at `at`.
    pub fn at(at: DateTime<Utc>) -> Self {
        Self {
            at,
            balance: None,
            equity: None,
            closed_pl: None,
            floating_pl: None,
            total_trades: None,
            wins: None,
            losses: None,
            win_rate_pct: None,
            profit_factor: None,
            max_drawdown_pct: None,
            roi_pct: None,
        }
    }
}
