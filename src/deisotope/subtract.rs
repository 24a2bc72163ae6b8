use super::IsotopeEnvelope;
use crate::index::index_greater_than;
use crate::numeric::interp;

/// Subtract the higher isotopes of `envelope` from one scan slice in place
/// and return the removed amount per position.
///
/// The slice is split into bands at the midpoints between consecutive
/// isotopes; the last band runs to the end of the slice. The first band is
/// the monoisotopic reference profile, baselined at its minimum. For every
/// further isotope the profile is shifted by the isotope's mass offset,
/// scaled by its relative abundance and linearly interpolated onto the
/// band's m/z positions (zero outside the profile), then subtracted.
/// Results are clamped at zero.
pub fn subtract_envelope(mz: &[f64], intensity: &mut [f64], envelope: &IsotopeEnvelope) -> Vec<f64> {
    let n = mz.len().min(intensity.len());
    let original: Vec<f64> = intensity[..n].to_vec();
    let masses = envelope.mz();
    let abundance = envelope.abundance();

    let mut bounds: Vec<usize> = masses
        .windows(2)
        .map(|w| index_greater_than((w[0] + w[1]) / 2.0, &mz[..n]))
        .collect();
    bounds.push(n);

    let reference_end = bounds[0];
    if reference_end == 0 {
        return vec![0.0; n];
    }
    let reference_mz = &mz[..reference_end];
    let floor = original[..reference_end]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);
    let reference: Vec<f64> = original[..reference_end].iter().map(|v| v - floor).collect();

    for k in 1..masses.len() {
        let offset = masses[k] - masses[0];
        let band = bounds[k - 1]..bounds[k].max(bounds[k - 1]);
        for j in band {
            let expected = interp(mz[j] - offset, reference_mz, &reference, 0.0, 0.0);
            intensity[j] -= expected * abundance[k];
        }
    }

    for v in intensity[..n].iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
    original
        .iter()
        .zip(&intensity[..n])
        .map(|(o, c)| o - c)
        .collect()
}
