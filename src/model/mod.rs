pub mod candidate;
pub mod config;
pub mod history;
pub mod quote;
pub mod result;

pub use candidate::CreditSpreadCandidate;
pub use config::{ChainFilter, PopModel, Preset, ScanConfig, SpreadParams};
pub use history::{PriceHistory, PriceHistoryBar};
pub use quote::{PutChain, PutQuote};
pub use result::{ScanOutcome, ScanReport, ScanResult, ScanStats, SkipReason};
