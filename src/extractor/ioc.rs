// file: src/extractor/ioc.rs
// description: two-stage indicator extraction (candidate scan, then semantic validation)
// reference: threat intelligence ioc standards

use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::extractor::crypto::{CoinValidator, validator_for};
use crate::extractor::patterns::{EMAIL, IPV4_ADDRESS};
use crate::models::{Indicator, IndicatorKind};
use crate::utils::Validator;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::trace;

pub struct IndicatorExtractor {
    emails: bool,
    ipv4: bool,
    coins: Vec<Box<dyn CoinValidator>>,
}

impl IndicatorExtractor {
    /// Emails, IPv4 and every supported coin.
    pub fn new() -> Self {
        Self {
            emails: true,
            ipv4: true,
            coins: crate::models::CoinType::ALL
                .iter()
                .map(|coin| validator_for(*coin))
                .collect(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let coins = config
            .coin_types()?
            .into_iter()
            .map(validator_for)
            .collect();

        Ok(Self {
            emails: config.emails,
            ipv4: config.ipv4,
            coins,
        })
    }

    /// Registers an additional coin validator, replacing any existing one for the same coin.
    pub fn with_coin(mut self, validator: Box<dyn CoinValidator>) -> Self {
        self.coins.retain(|existing| existing.coin() != validator.coin());
        self.coins.push(validator);
        self
    }

    pub fn enabled_kinds(&self) -> Vec<IndicatorKind> {
        let mut kinds = Vec::new();
        if self.emails {
            kinds.push(IndicatorKind::Email);
        }
        if self.ipv4 {
            kinds.push(IndicatorKind::Ipv4);
        }
        kinds.extend(
            self.coins
                .iter()
                .map(|coin| IndicatorKind::CryptoAddress(coin.coin())),
        );
        kinds
    }

    /// Content never makes this fail: text without indicators yields an empty set.
    pub fn extract(&self, text: &str) -> BTreeSet<Indicator> {
        let mut indicators = BTreeSet::new();

        if self.emails {
            scan(
                &mut indicators,
                text,
                &EMAIL,
                IndicatorKind::Email,
                Validator::is_valid_email,
            );
        }

        if self.ipv4 {
            scan(
                &mut indicators,
                text,
                &IPV4_ADDRESS,
                IndicatorKind::Ipv4,
                Validator::is_valid_ipv4,
            );
        }

        for coin in &self.coins {
            scan(
                &mut indicators,
                text,
                coin.candidate_pattern(),
                IndicatorKind::CryptoAddress(coin.coin()),
                |candidate| coin.is_valid(candidate),
            );
        }

        indicators
    }
}

impl Default for IndicatorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn scan(
    indicators: &mut BTreeSet<Indicator>,
    text: &str,
    pattern: &Regex,
    kind: IndicatorKind,
    is_valid: impl Fn(&str) -> bool,
) {
    let mut rejected = BTreeSet::new();

    for candidate in pattern.find_iter(text) {
        let value = candidate.as_str();
        if rejected.contains(value) {
            continue;
        }

        let indicator = Indicator::new(kind, value);
        if indicators.contains(&indicator) {
            continue;
        }

        if is_valid(value) {
            indicators.insert(indicator);
        } else {
            trace!("Rejected {} candidate: {}", kind, value);
            rejected.insert(value);
        }
    }
}
