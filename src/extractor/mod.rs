// file: src/extractor/mod.rs
// description: indicator extraction module exports
// reference: internal module structure

pub mod crypto;
pub mod ioc;
pub mod patterns;

pub use crypto::{BitcoinValidator, CoinValidator, validator_for};
pub use ioc::IndicatorExtractor;
