//! Rock-Paper-Scissors opponent modelling.
//!
//! [`engine::predictor::Predictor`] is the player; the rest of the crate
//! pits it against reference strategies and reports how it fares.

pub mod engine;
