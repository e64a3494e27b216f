use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::config::ChainFilter;

/// A single put quote for one strike and expiration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutQuote {
    pub strike: f64,
    pub expiration: NaiveDate,
    pub days_to_expiration: i64,
    pub bid: f64,
    pub ask: f64,
}

impl PutQuote {
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Two-sided, uncrossed, inside the DTE window and above the mid floor.
    pub fn is_usable(&self, filter: &ChainFilter) -> bool {
        self.strike.is_finite()
            && self.strike > 0.0
            && self.bid.is_finite()
            && self.ask.is_finite()
            && self.bid > 0.0
            && self.ask > 0.0
            && self.bid <= self.ask
            && (filter.min_dte..=filter.max_dte).contains(&self.days_to_expiration)
            && self.mid() >= filter.min_mid
    }
}

/// Usable puts of one underlying, sorted ascending by strike, ties by expiration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutChain {
    quotes: Vec<PutQuote>,
}

impl PutChain {
    /// Drop unusable quotes and sort what remains.
    pub fn from_quotes(quotes: Vec<PutQuote>, filter: &ChainFilter) -> Self {
        let mut quotes: Vec<PutQuote> = quotes.into_iter().filter(|q| q.is_usable(filter)).collect();
        quotes.sort_by(|a, b| {
            a.strike
                .total_cmp(&b.strike)
                .then_with(|| a.expiration.cmp(&b.expiration))
        });
        Self { quotes }
    }

    pub fn quotes(&self) -> &[PutQuote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Split into single-expiration chains, earliest expiration first.
    /// Strike order is preserved inside each sub-chain.
    pub fn by_expiration(&self) -> Vec<PutChain> {
        let mut expirations: Vec<NaiveDate> = self.quotes.iter().map(|q| q.expiration).collect();
        expirations.sort();
        expirations.dedup();

        expirations
            .into_iter()
            .map(|exp| PutChain {
                quotes: self
                    .quotes
                    .iter()
                    .filter(|q| q.expiration == exp)
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(strike: f64, exp: NaiveDate, dte: i64, bid: f64, ask: f64) -> PutQuote {
        PutQuote {
            strike,
            expiration: exp,
            days_to_expiration: dte,
            bid,
            ask,
        }
    }

    #[test]
    fn test_chain_filters_and_sorts() {
        let e1 = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        let e2 = NaiveDate::from_ymd_opt(2025, 1, 24).unwrap();
        let filter = ChainFilter::default();

        let chain = PutChain::from_quotes(
            vec![
                quote(95.0, e2, 40, 1.0, 1.1),
                quote(90.0, e1, 33, 0.5, 0.6),
                quote(95.0, e1, 33, 0.9, 1.0),
                quote(85.0, e1, 33, 0.0, 0.1),  // no bid
                quote(80.0, e1, 33, 0.02, 0.04), // mid below floor
                quote(75.0, e1, 60, 0.5, 0.6),  // outside DTE window
                quote(70.0, e1, 33, 0.7, 0.6),  // crossed
            ],
            &filter,
        );

        let keys: Vec<(f64, NaiveDate)> = chain.quotes().iter().map(|q| (q.strike, q.expiration)).collect();
        assert_eq!(keys, vec![(90.0, e1), (95.0, e1), (95.0, e2)]);

        let groups = chain.by_expiration();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].quotes()[0].strike, 95.0);
    }
}
