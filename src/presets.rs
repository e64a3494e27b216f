use put_spread_scanner::model::Preset;

/// Print a human-readable listing of the threshold presets.
pub fn run() -> anyhow::Result<()> {
    println!("Threshold Presets");
    println!("=================");
    println!();
    println!(
        "  {:<14} {:>6} {:>6} {:>6} {:>10}",
        "Preset", "R:R", "POP", "IVR", "Width"
    );
    println!("  {}", "-".repeat(46));
    for preset in Preset::ALL {
        let (min_rr, min_pop, min_ivr, max_width) = preset.thresholds();
        println!(
            "  {:<14} {:>6} {:>5}% {:>6} {:>9}%",
            preset.name(),
            format!(">={min_rr}"),
            min_pop,
            min_ivr,
            max_width,
        );
    }
    println!();
    for preset in Preset::ALL {
        println!("  {:<14} {}", preset.name(), preset.description());
    }
    println!();
    println!("Pick one with `scan --preset <name>`; --min-rr, --min-pop, --min-ivr and");
    println!("--max-width override individual thresholds on top of it.");
    Ok(())
}
