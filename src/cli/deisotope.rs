use anyhow::{bail, Context, Result};
use log::info;
use std::io::Write;
use std::path::PathBuf;

use rpd::chemistry::{Adduct, Formula, NaturalAbundanceProvider};
use rpd::deisotope::{DeisotopeTarget, IsotopeSubtractor};
use rpd::extract::{ChromatogramExtraction, ExtractionMode, Extractor};

use super::extract::cell;
use super::{load, tsv_writer, Config};

/// Parse `FORMULA:RT:RT_TOL:MZ_TOL`.
///
/// `FORMULA` is either a charged ion such as `C6H12O6Na+` or a neutral
/// formula followed by adduct notation, e.g. `C6H12O6[M+Na]+`.
pub fn parse_target(text: &str) -> Result<DeisotopeTarget, String> {
    let fields: Vec<&str> = text.split(':').map(str::trim).collect();
    let [formula, rt, rt_tolerance, mz_tolerance] = fields.as_slice() else {
        return Err(format!("expected FORMULA:RT:RT_TOL:MZ_TOL, got '{text}'"));
    };
    let number = |name: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| format!("{name} '{value}' is not a number"))
    };
    Ok(DeisotopeTarget::new(
        ion_formula(formula)?,
        number("RT", rt)?,
        number("RT tolerance", rt_tolerance)?,
        number("m/z tolerance", mz_tolerance)?,
    ))
}

fn ion_formula(text: &str) -> Result<String, String> {
    let Some(bracket) = text.find('[') else {
        return Ok(text.to_string());
    };
    let neutral = Formula::parse(&text[..bracket]).map_err(|e| e.to_string())?;
    let adduct = Adduct::parse(&text[bracket..]).map_err(|e| e.to_string())?;
    let ion = adduct.apply(&neutral).map_err(|e| e.to_string())?;
    Ok(ion.to_string())
}

/// Apply isotope subtraction to a run and report the outcome
pub fn run(file: PathBuf, targets: Vec<DeisotopeTarget>, output: Option<PathBuf>, config: &Config) -> Result<()> {
    let targets = if targets.is_empty() {
        config.deisotope.targets.clone()
    } else {
        targets
    };
    if targets.is_empty() {
        bail!("No targets given; pass --target or list [[deisotope.targets]] in the config");
    }

    let mut loaded = load(&file)?;
    let subtractor = IsotopeSubtractor::new(NaturalAbundanceProvider::new());
    let resolved = subtractor.resolve(&targets).context("Failed to resolve targets")?;
    let report = subtractor
        .apply(&mut loaded.dataset, &targets)
        .context("Isotope subtraction failed")?;

    info!("Subtracted {} targets from {}", report.targets_applied, file.display());
    println!("Isotope subtraction: {}", file.display());
    println!("  Targets applied: {}", report.targets_applied);
    println!("  Scans touched: {}", report.scans_touched);
    println!("  Intensity removed: {:.3}", report.intensity_removed);
    for (target, envelope) in &resolved {
        println!(
            "  {} @ RT {} ± {}: m/z {:.4}-{:.4} ({} isotopes)",
            target.formula,
            target.rt,
            target.rt_tolerance,
            envelope.monoisotopic_mz(),
            envelope.last_mz(),
            envelope.len()
        );
    }

    let Some(output) = output else {
        return Ok(());
    };
    let extractor = Extractor::new(&loaded.dataset);
    let mut writer = tsv_writer(Some(&output))?;
    writer.write_record(["target", "rt", "intensity", "before_subtraction"])?;
    for (target, envelope) in &resolved {
        let mz_lo = envelope.monoisotopic_mz() - target.mz_tolerance;
        let mz_hi = envelope.last_mz() + target.mz_tolerance;
        let extraction = extractor.chromatogram(mz_lo, mz_hi, ExtractionMode::Exact);
        write_before_after(&mut writer, &target.formula, &extraction)?;
    }
    writer.flush().context("Failed to write chromatograms")?;
    info!("Wrote before/after chromatograms to {}", output.display());
    Ok(())
}

/// `target  rt  intensity  before_subtraction` rows for one target.
///
/// Scans without subtracted signal in the window report their current value
/// as the before value.
fn write_before_after<W: Write>(
    writer: &mut csv::Writer<W>,
    formula: &str,
    extraction: &ChromatogramExtraction,
) -> Result<()> {
    let current = &extraction.current;
    for (i, rt) in current.retention_time.iter().enumerate() {
        let before = extraction
            .before_subtraction
            .as_ref()
            .and_then(|before| before.intensity[i])
            .or(current.intensity[i]);
        writer.write_record([formula.to_string(), rt.to_string(), cell(current.intensity[i]), cell(before)])?;
    }
    Ok(())
}
