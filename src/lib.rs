//! # optanalytics
//!
//! Derivatives analytics engine for European equity options.
//!
//! Takes already-fetched market data (option chains, spot, marked vols) and
//! turns it into prices, implied volatilities, risk-neutral distributions,
//! volatility surfaces and scenario P&L grids.
//!
//! ## Architecture
//!
//! - **`pricing`**: Black-Scholes-Merton price, Greeks and ITM probability
//! - **`implied`**: bisection implied-volatility solver
//! - **`distribution`**: lognormal risk-neutral terminal-price distribution
//! - **`surface`**: binned, filled and smoothed log-moneyness × maturity grid
//! - **`smile`**: quadratic smile fit used for skew and curvature
//! - **`scenario`**: spot × vol repricing grids
//! - **`chain`** and **`quote`**: contract lookup and premium resolution
//! - **`analytics`**: request-level entry points with validation and warnings
//!
//! ## Design
//!
//! - **Pure, synchronous computation.** No I/O, no shared state, no internal
//!   threads unless the `parallel` feature is enabled, in which case surface
//!   rows and scenario rows are built with rayon.
//! - **No panics.** Fallible operations return [`Result`]. The numerical
//!   core propagates non-finite values or returns `Option` instead of
//!   failing; only the request layer produces [`AnalyticsError`].
//! - **Explicit configuration.** Iteration caps, brackets, grid sizes and
//!   warning thresholds live in [`EngineConfig`].
//! - **Serializable.** Requests, responses and value types implement Serde
//!   with camelCase field names.
//!
//! ```
//! use optanalytics::pricing::{greeks, price};
//! use optanalytics::types::{OptionParams, OptionType};
//! use optanalytics::ImpliedVolSolver;
//!
//! let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 1.0);
//! let premium = price(&p, 0.2);
//! assert!((premium - 8.4333).abs() < 1e-4);
//! assert!((greeks(&p, 0.2).delta - 0.5596).abs() < 1e-4);
//!
//! let vol = ImpliedVolSolver::default().solve(&p, premium).unwrap();
//! assert!((vol.0 - 0.2).abs() < 1e-4);
//! ```

pub mod analytics;
pub mod chain;
pub mod config;
pub mod conventions;
pub mod distribution;
pub mod error;
pub mod implied;
pub mod pricing;
pub mod quote;
pub mod scenario;
pub mod smile;
pub mod surface;
pub mod types;
mod validate;

#[doc(inline)]
pub use chain::OptionChain;
#[doc(inline)]
pub use config::EngineConfig;
#[doc(inline)]
pub use error::{AnalyticsError, ErrorBody, Result};
#[doc(inline)]
pub use implied::ImpliedVolSolver;
#[doc(inline)]
pub use quote::{ContractQuote, PriceSource};
#[doc(inline)]
pub use surface::{SurfaceBuilder, SurfacePoint};
#[doc(inline)]
pub use types::{Greeks, OptionParams, OptionType, Vol};
