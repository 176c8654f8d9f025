//! Behavioural tests driven by the feature files under `tests/features`.

mod cache_coherence;
mod queries;
