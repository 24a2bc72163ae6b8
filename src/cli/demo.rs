use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use rpd::chemistry::{Adduct, Formula, NaturalAbundanceProvider};
use rpd::codec::{write_run, ContainerVersion};
use rpd::dataset::{setting_keys, InstrumentInfo, RtUnit, RunDataset, RunDatasetBuilder, Scan, ScanSettings, SpectrumKind};
use rpd::deisotope::IsotopeEnvelope;

use super::Config;

const MZ_START: f64 = 100.0;
const MZ_END: f64 = 300.0;
const MZ_STEP: f64 = 0.025;
const PEAK_SIGMA: f64 = 0.01;
const RT_STEP: f64 = 0.05;

/// Compound eluting in the demo run
struct DemoCompound {
    neutral: &'static str,
    adduct: &'static str,
    apex_rt: f64,
    rt_sigma: f64,
    height: f64,
}

const COMPOUNDS: &[DemoCompound] = &[
    DemoCompound {
        neutral: "C6H12O6",
        adduct: "[M+Na]+",
        apex_rt: 2.0,
        rt_sigma: 0.08,
        height: 2.0e5,
    },
    DemoCompound {
        neutral: "C8H10N4O2",
        adduct: "[M+H]+",
        apex_rt: 3.5,
        rt_sigma: 0.1,
        height: 5.0e5,
    },
];

/// Generate a synthetic profile-mode LC-MS run and write it as a container
pub fn run(
    output: PathBuf,
    scans: usize,
    compression_level: Option<u32>,
    format_version: Option<String>,
    config: &Config,
) -> Result<()> {
    info!("rpd - synthetic LC-MS run");
    info!("=========================");

    let version = format_version
        .as_deref()
        .map(str::parse::<ContainerVersion>)
        .transpose()
        .context("Invalid --format-version")?;
    let options = config.encode_options(compression_level, version);

    info!("Generating {} scans...", scans);
    let mut dataset = generate_run(scans)?;
    let summary = dataset.summary();
    info!("  {}", summary);

    let hash = write_run(&mut dataset, &output, &options).context("Failed to write container")?;

    let file_size = std::fs::metadata(&output).map(|m| m.len()).unwrap_or(0);
    info!("Done!");
    info!("  Output file: {}", output.display());
    info!("  Container version: {}", options.version);
    info!("  Identity hash: {}", hash);
    info!(
        "  File size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1024.0 / 1024.0
    );

    let raw = dataset.scan_count() * dataset.width() * 16;
    if file_size > 0 {
        info!("  Compression ratio: {:.1}x", raw as f64 / file_size as f64);
    }

    Ok(())
}

/// Build the synthetic run: a fixed profile grid with per-scan jitter, a
/// low noise floor, and the isotope envelopes of the demo compounds.
pub(super) fn generate_run(scans: usize) -> Result<RunDataset> {
    let provider = NaturalAbundanceProvider::new();
    let mut envelopes = Vec::with_capacity(COMPOUNDS.len());
    for compound in COMPOUNDS {
        let neutral: Formula = compound.neutral.parse()?;
        let ion = Adduct::parse(compound.adduct)?.apply(&neutral)?.to_string();
        let envelope = IsotopeEnvelope::resolve(&provider, &ion)?;
        log::debug!(
            "{} {} -> {} at m/z {:.4} ({} isotopes)",
            compound.neutral,
            compound.adduct,
            ion,
            envelope.monoisotopic_mz(),
            envelope.len()
        );
        envelopes.push((compound, envelope));
    }

    let width = ((MZ_END - MZ_START) / MZ_STEP).round() as usize + 1;
    let settings = ScanSettings::new(InstrumentInfo::new("Esi", "TimeOfFlight"))
        .with_entry(setting_keys::POLARITY, "Positive")
        .with_entry(setting_keys::SCAN_MODE, "Scan");
    let mut builder = RunDatasetBuilder::new(SpectrumKind::Continuous)
        .rt_unit(RtUnit::Minutes)
        .settings(settings);

    for row in 0..scans {
        let rt = row as f64 * RT_STEP;
        let jitter = ((row % 7) as f64 - 3.0) * MZ_STEP * 0.04;
        // Every fifth scan stops early so the run carries padding.
        let columns = if row % 5 == 4 { width - 40 * (1 + row % 3) } else { width };

        let mz: Vec<f64> = (0..columns)
            .map(|k| MZ_START + k as f64 * MZ_STEP + jitter)
            .collect();
        let mut intensity: Vec<f64> = (0..columns)
            .map(|k| 50.0 + 25.0 * ((k as f64 * 0.37 + row as f64 * 1.3).sin() + 1.0))
            .collect();

        for (compound, envelope) in &envelopes {
            let elution = (-0.5 * ((rt - compound.apex_rt) / compound.rt_sigma).powi(2)).exp();
            if elution < 1e-6 {
                continue;
            }
            for (&center, &abundance) in envelope.mz().iter().zip(envelope.abundance()) {
                add_profile_peak(&mz, &mut intensity, center, compound.height * elution * abundance);
            }
        }

        builder.push_scan(Scan::new(rt, mz, intensity));
    }

    Ok(builder.build()?)
}

/// Add a Gaussian profile peak to the columns within five sigma of `center`
fn add_profile_peak(mz: &[f64], intensity: &mut [f64], center: f64, height: f64) {
    let lo = mz.partition_point(|&m| m < center - 5.0 * PEAK_SIGMA);
    let hi = mz.partition_point(|&m| m <= center + 5.0 * PEAK_SIGMA);
    for k in lo..hi {
        intensity[k] += height * (-0.5 * ((mz[k] - center) / PEAK_SIGMA).powi(2)).exp();
    }
}
