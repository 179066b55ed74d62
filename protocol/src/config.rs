//! Per-session protocol configuration shared out of band.

use prand_types::ThresholdParams;
use serde::{Deserialize, Serialize};

/// What a server does when one dealer's deal cannot be decoded or answered
/// during round 3.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedDealPolicy {
    /// Abort the whole session.
    #[default]
    Abort,
    /// Log the offending dealer, skip its slot, and continue.
    SkipDealer,
}

/// Which retained shares a server reveals in R4.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPolicy {
    /// Reveal every share held; the client picks what it needs.
    #[default]
    All,
    /// Reveal only shares of dealers present in I4.
    AcceptedOnly,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub params: ThresholdParams,
    #[serde(default)]
    pub malformed_deal_policy: MalformedDealPolicy,
    #[serde(default)]
    pub reveal_policy: RevealPolicy,
}

impl SessionConfig {
    pub fn new(params: ThresholdParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }
}
