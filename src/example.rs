use put_spread_scanner::model::{Preset, ScanConfig};

/// Print an example config JSON to stdout.
pub fn run() -> anyhow::Result<()> {
    let config = ScanConfig {
        universe: ["SPY", "QQQ", "IWM", "AAPL", "MSFT", "NVDA", "AMD", "TSLA"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        preferred_set: ["SPY", "QQQ", "IWM"].iter().map(|s| s.to_string()).collect(),
        ..Preset::Aggressive.config()
    };
    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");
    Ok(())
}
