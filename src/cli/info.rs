use anyhow::Result;
use std::path::PathBuf;

/// Display information about an .rpd container
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let loaded = super::load(&file)?;
    let dataset = &loaded.dataset;
    let file_size = std::fs::metadata(&file).map(|m| m.len()).unwrap_or(0);

    println!("rpd Container Information");
    println!("=========================");
    println!("File: {}", file.display());
    println!("Container version: {}", loaded.version);
    println!("Identity hash: {}", dataset.identity_hash().unwrap_or("-"));
    println!(
        "File size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );
    println!();
    println!("{}", dataset.summary());
    println!();

    let settings = dataset.settings();
    println!("Acquisition:");
    println!("  Ionization: {}", settings.instrument().ionization);
    println!("  Analyzer: {}", settings.instrument().analyzer);
    for (key, value) in settings.entries() {
        println!("  {}: {}", key, value);
    }
    println!();

    let sentinels = dataset.sentinel_starts();
    println!("Band index (reference row {}):", dataset.reference_row());
    let index = dataset.index();
    let widest = (0..index.width())
        .map(|i| index.upper()[i] - index.lower()[i] + 1)
        .max()
        .unwrap_or(0);
    println!("  Widest bracket: {} columns", widest);
    println!("  Padded scans: {}", sentinels.len());

    Ok(())
}
