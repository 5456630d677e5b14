pub mod models;
pub mod predictor;
pub mod bot_strategy;
pub mod simulator;
pub mod arena;
pub mod bot_profiles;
