//! Market quotes and premium resolution.
//!
//! A contract's premium can come from several fields of its quote. Which
//! field is wanted is a [`PriceSource`]; which field was actually used is
//! recorded in a [`ResolvedPremium`] so responses can report it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Where a premium is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    #[default]
    Mid,
    Bid,
    Ask,
    Last,
    /// Priced by the model from a vendor or default volatility.
    Model,
}

impl PriceSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mid => "mid",
            Self::Bid => "bid",
            Self::Ask => "ask",
            Self::Last => "last",
            Self::Model => "model",
        }
    }

    /// Market sources tried in order when this one is unavailable.
    ///
    /// `Model` has no market fallback; it is resolved by the scenario base.
    pub fn fallback_chain(self) -> &'static [PriceSource] {
        match self {
            Self::Mid => &[Self::Mid, Self::Last],
            Self::Bid => &[Self::Bid, Self::Mid, Self::Last],
            Self::Ask => &[Self::Ask, Self::Mid, Self::Last],
            Self::Last => &[Self::Last, Self::Mid],
            Self::Model => &[],
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceSource {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mid" => Ok(Self::Mid),
            "bid" => Ok(Self::Bid),
            "ask" => Ok(Self::Ask),
            "last" => Ok(Self::Last),
            "model" => Ok(Self::Model),
            other => Err(AnalyticsError::invalid(format!(
                "priceSource must be mid, bid, ask, last, or model, got {other:?}"
            ))),
        }
    }
}

/// Raw quote fields for one contract. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractQuote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    /// Implied volatility published by the data vendor.
    pub vendor_iv: Option<f64>,
    pub volume: Option<f64>,
    pub open_interest: Option<f64>,
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

impl ContractQuote {
    /// `(bid + ask) / 2` when both sides are finite.
    pub fn mid(&self) -> Option<f64> {
        Some(0.5 * (finite(self.bid)? + finite(self.ask)?))
    }

    /// Mid only when both sides are strictly positive.
    pub fn two_sided_mid(&self) -> Option<f64> {
        let (bid, ask) = (positive(self.bid)?, positive(self.ask)?);
        positive(Some(0.5 * (bid + ask)))
    }

    /// Raw field for a market source. `Model` has no market field.
    pub fn field(&self, source: PriceSource) -> Option<f64> {
        match source {
            PriceSource::Mid => self.mid(),
            PriceSource::Bid => finite(self.bid),
            PriceSource::Ask => finite(self.ask),
            PriceSource::Last => finite(self.last),
            PriceSource::Model => None,
        }
    }

    /// Vendor IV when finite and positive.
    pub fn usable_vendor_iv(&self) -> Option<f64> {
        positive(self.vendor_iv)
    }

    /// Absolute spread and spread as a percentage of mid.
    ///
    /// The percentage is `+Inf` when mid is not positive.
    pub fn spread(&self) -> Option<Spread> {
        let (bid, ask) = (finite(self.bid)?, finite(self.ask)?);
        let mid = 0.5 * (bid + ask);
        let absolute = ask - bid;
        let pct = if mid > 0.0 {
            absolute / mid * 100.0
        } else {
            f64::INFINITY
        };
        Some(Spread { absolute, pct })
    }

    /// The requested source only, no fallback. Must be finite and positive.
    pub fn resolve_strict(&self, source: PriceSource) -> Option<ResolvedPremium> {
        let premium = positive(self.field(source))?;
        Some(ResolvedPremium {
            premium,
            requested: source,
            used: source,
        })
    }

    /// First finite, positive premium along `source.fallback_chain()`.
    pub fn resolve_with_fallback(&self, source: PriceSource) -> Option<ResolvedPremium> {
        source.fallback_chain().iter().find_map(|&candidate| {
            positive(self.field(candidate)).map(|premium| ResolvedPremium {
                premium,
                requested: source,
                used: candidate,
            })
        })
    }
}

/// Bid/ask spread of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    pub absolute: f64,
    pub pct: f64,
}

/// A premium together with the source that supplied it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPremium {
    pub premium: f64,
    pub requested: PriceSource,
    pub used: PriceSource,
}

impl ResolvedPremium {
    pub fn fell_back(&self) -> bool {
        self.requested != self.used
    }

    /// Advisory message when a fallback source was used.
    pub fn fallback_warning(&self) -> Option<String> {
        self.fell_back().then(|| {
            format!(
                "Price source \"{}\" unavailable. Using {} price instead.",
                self.requested, self.used
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(bid: Option<f64>, ask: Option<f64>, last: Option<f64>) -> ContractQuote {
        ContractQuote {
            bid,
            ask,
            last,
            ..ContractQuote::default()
        }
    }

    #[test]
    fn mid_requires_both_sides() {
        assert_eq!(quote(Some(1.0), Some(1.2), None).mid(), Some(1.1));
        assert_eq!(quote(Some(1.0), None, None).mid(), None);
        assert_eq!(quote(Some(f64::NAN), Some(1.0), None).mid(), None);
    }

    #[test]
    fn two_sided_mid_rejects_zero_bid() {
        assert_eq!(quote(Some(0.0), Some(0.2), None).two_sided_mid(), None);
        assert_eq!(quote(Some(0.0), Some(0.2), None).mid(), Some(0.1));
    }

    #[test]
    fn strict_resolution_has_no_fallback() {
        let q = quote(Some(0.0), Some(2.0), Some(1.5));
        assert!(q.resolve_strict(PriceSource::Bid).is_none());
        let r = q.resolve_strict(PriceSource::Ask).unwrap();
        assert_eq!(r.premium, 2.0);
        assert!(!r.fell_back());
        assert!(q.resolve_strict(PriceSource::Model).is_none());
    }

    #[test]
    fn fallback_goes_to_mid_then_last() {
        let q = quote(Some(0.0), Some(2.0), Some(1.5));
        let r = q.resolve_with_fallback(PriceSource::Bid).unwrap();
        assert_eq!(r.used, PriceSource::Mid);
        assert_eq!(r.premium, 1.0);
        assert_eq!(
            r.fallback_warning().as_deref(),
            Some("Price source \"bid\" unavailable. Using mid price instead.")
        );

        let only_last = quote(None, None, Some(1.5));
        let r = only_last.resolve_with_fallback(PriceSource::Ask).unwrap();
        assert_eq!(r.used, PriceSource::Last);
        assert_eq!(r.premium, 1.5);

        assert!(quote(None, None, None)
            .resolve_with_fallback(PriceSource::Mid)
            .is_none());
    }

    #[test]
    fn spread_percentage_of_mid() {
        let s = quote(Some(0.9), Some(1.1), None).spread().unwrap();
        assert!((s.absolute - 0.2).abs() < 1e-12);
        assert!((s.pct - 20.0).abs() < 1e-9);
        let s = quote(Some(0.0), Some(0.0), None).spread().unwrap();
        assert!(s.pct.is_infinite());
    }

    #[test]
    fn price_source_parses_and_rejects() {
        assert_eq!("MID".parse::<PriceSource>().unwrap(), PriceSource::Mid);
        assert_eq!("model".parse::<PriceSource>().unwrap(), PriceSource::Model);
        assert!("close".parse::<PriceSource>().is_err());
    }

    #[test]
    fn quote_deserializes_with_missing_fields() {
        let q: ContractQuote = serde_json::from_str(r#"{"bid":1.0,"vendorIv":0.3}"#).unwrap();
        assert_eq!(q.bid, Some(1.0));
        assert_eq!(q.ask, None);
        assert_eq!(q.usable_vendor_iv(), Some(0.3));
    }
}
