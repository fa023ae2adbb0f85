pub mod recommendation;
pub mod strategy;

pub use recommendation::{build_recommendation, RecommendationInputs};
pub use strategy::{
    clamp_rate_pct, pct_to_rate_wei, recommended_rate_pct, strategy_for, Strategy,
};
