//! Single-expiry smile fitting.
//!
//! A smile is implied volatility as a function of log-moneyness at one
//! expiry. The surface constructor fits a [`QuadraticSmile`] to the raw
//! observations of its target expiry and reports the linear coefficient as
//! skew and the quadratic coefficient as a curvature proxy.

pub mod quadratic;

pub use quadratic::QuadraticSmile;
