//! Implied volatility extraction from option prices.
//!
//! [`ImpliedVolSolver`] inverts the BSM price by bisection over a bounded
//! volatility bracket, using [`pricing::price`](crate::pricing::price) as
//! its forward function.

pub mod bisection;

pub use bisection::{ImpliedVolSolver, Solution, SolveFailure};
