use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use rpd::extract::{AucOptions, ChromatogramExtraction, ExtractionMode, Extractor, SpectrumExtraction};

use super::{load, mode_label, tsv_writer};

/// Chromatogram over `[mz_lo, mz_hi]` as `rt  intensity` rows
pub fn chromatogram(file: PathBuf, mz_lo: f64, mz_hi: f64, mode: ExtractionMode, output: Option<PathBuf>) -> Result<()> {
    let loaded = load(&file)?;
    log::info!(
        "Extracting {} chromatogram for m/z {}-{} from {}",
        mode_label(mode),
        mz_lo,
        mz_hi,
        file.display()
    );
    let extraction = Extractor::new(&loaded.dataset).chromatogram(mz_lo, mz_hi, mode);
    let mut writer = tsv_writer(output.as_deref())?;
    write_chromatogram(&mut writer, &extraction)?;
    writer.flush().context("Failed to write chromatogram")?;
    Ok(())
}

/// Averaged spectrum over RT `(rt_lo, rt_hi]` as `mz  intensity` rows
pub fn spectrum(file: PathBuf, rt_lo: f64, rt_hi: f64, mode: ExtractionMode, output: Option<PathBuf>) -> Result<()> {
    let loaded = load(&file)?;
    log::info!(
        "Extracting {} spectrum for RT {}-{} from {}",
        mode_label(mode),
        rt_lo,
        rt_hi,
        file.display()
    );
    let extraction = Extractor::new(&loaded.dataset).spectrum(rt_lo, rt_hi, mode);
    if extraction.current.is_empty() {
        log::warn!("No scans in RT window ({rt_lo}, {rt_hi}]");
    }
    let mut writer = tsv_writer(output.as_deref())?;
    write_spectrum(&mut writer, &extraction)?;
    writer.flush().context("Failed to write spectrum")?;
    Ok(())
}

/// Peak metrics printed as JSON
pub fn auc(file: PathBuf, mz_lo: f64, mz_hi: f64, rt_lo: f64, rt_hi: f64) -> Result<()> {
    let loaded = load(&file)?;
    let metrics = Extractor::new(&loaded.dataset).chromatogram_auc(mz_lo, mz_hi, rt_lo, rt_hi, AucOptions::all());
    match metrics {
        Some(metrics) => println!("{}", serde_json::to_string_pretty(&metrics)?),
        None => {
            eprintln!("Fewer than two scans in RT window ({rt_lo}, {rt_hi}]; no peak metrics");
            println!("null");
        }
    }
    Ok(())
}

/// Missing values become empty cells
pub(super) fn cell(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

pub(super) fn write_chromatogram<W: Write>(writer: &mut csv::Writer<W>, extraction: &ChromatogramExtraction) -> Result<()> {
    let current = &extraction.current;
    match &extraction.before_subtraction {
        Some(before) => {
            writer.write_record(["rt", "intensity", "before_subtraction"])?;
            for (i, rt) in current.retention_time.iter().enumerate() {
                // untouched scans keep their current value
                let original = before.intensity[i].or(current.intensity[i]);
                writer.write_record([rt.to_string(), cell(current.intensity[i]), cell(original)])?;
            }
        }
        None => {
            writer.write_record(["rt", "intensity"])?;
            for (rt, value) in current.retention_time.iter().zip(&current.intensity) {
                writer.write_record([rt.to_string(), cell(*value)])?;
            }
        }
    }
    Ok(())
}

pub(super) fn write_spectrum<W: Write>(writer: &mut csv::Writer<W>, extraction: &SpectrumExtraction) -> Result<()> {
    writer.write_record(["segment", "mz", "intensity"])?;
    for (mz, intensity) in extraction.current.mz.iter().zip(&extraction.current.intensity) {
        writer.write_record(["current".to_string(), mz.to_string(), intensity.to_string()])?;
    }
    if let Some(segments) = &extraction.before_subtraction {
        for (n, segment) in segments.iter().enumerate() {
            for (mz, intensity) in segment.mz.iter().zip(&segment.intensity) {
                writer.write_record([format!("before_{n}"), mz.to_string(), intensity.to_string()])?;
            }
        }
    }
    Ok(())
}
