use schemars::schema_for;

use put_spread_scanner::model::ScanConfig;

/// Generate and print the JSON Schema for `ScanConfig`.
pub fn run() -> anyhow::Result<()> {
    let schema = schema_for!(ScanConfig);
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{json}");
    Ok(())
}
