//! Natural isotope table (NIST relative atomic masses and isotopic
//! compositions) for the elements common in small-molecule LC-MS.

/// One stable isotope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isotope {
    /// Relative atomic mass (Da)
    pub mass: f64,
    /// Natural abundance, fraction of 1
    pub abundance: f64,
    /// Nucleon count
    pub mass_number: u32,
}

const fn iso(mass: f64, abundance: f64, mass_number: u32) -> Isotope {
    Isotope {
        mass,
        abundance,
        mass_number,
    }
}

const H: &[Isotope] = &[iso(1.00782503223, 0.999885, 1), iso(2.01410177812, 0.000115, 2)];
// fully labelled hydrogen
const D: &[Isotope] = &[iso(2.01410177812, 1.0, 2)];
const C: &[Isotope] = &[iso(12.0, 0.9893, 12), iso(13.00335483507, 0.0107, 13)];
const N: &[Isotope] = &[iso(14.00307400443, 0.99636, 14), iso(15.00010889888, 0.00364, 15)];
const O: &[Isotope] = &[
    iso(15.99491461957, 0.99757, 16),
    iso(16.99913175650, 0.00038, 17),
    iso(17.99915961286, 0.00205, 18),
];
const F: &[Isotope] = &[iso(18.99840316273, 1.0, 19)];
const NA: &[Isotope] = &[iso(22.9897692820, 1.0, 23)];
const SI: &[Isotope] = &[
    iso(27.97692653465, 0.92223, 28),
    iso(28.97649466490, 0.04685, 29),
    iso(29.973770136, 0.03092, 30),
];
const P: &[Isotope] = &[iso(30.97376199842, 1.0, 31)];
const S: &[Isotope] = &[
    iso(31.9720711744, 0.9499, 32),
    iso(32.9714589098, 0.0075, 33),
    iso(33.967867004, 0.0425, 34),
    iso(35.96708071, 0.0001, 36),
];
const CL: &[Isotope] = &[iso(34.968852682, 0.7576, 35), iso(36.965902602, 0.2424, 37)];
const K: &[Isotope] = &[
    iso(38.9637064864, 0.932581, 39),
    iso(39.963998166, 0.000117, 40),
    iso(40.9618252579, 0.067302, 41),
];
const BR: &[Isotope] = &[iso(78.9183376, 0.5069, 79), iso(80.9162897, 0.4931, 81)];
const I: &[Isotope] = &[iso(126.9044719, 1.0, 127)];

/// Stable isotopes of an element, ascending by mass
pub fn isotopes(symbol: &str) -> Option<&'static [Isotope]> {
    let table = match symbol {
        "H" => H,
        "D" => D,
        "C" => C,
        "N" => N,
        "O" => O,
        "F" => F,
        "Na" => NA,
        "Si" => SI,
        "P" => P,
        "S" => S,
        "Cl" => CL,
        "K" => K,
        "Br" => BR,
        "I" => I,
        _ => return None,
    };
    Some(table)
}

/// Mass of the most abundant isotope
pub fn most_abundant_mass(symbol: &str) -> Option<f64> {
    isotopes(symbol)?
        .iter()
        .max_by(|a, b| a.abundance.total_cmp(&b.abundance))
        .map(|i| i.mass)
}

/// Symbols known to the table
pub const SYMBOLS: &[&str] = &[
    "H", "D", "C", "N", "O", "F", "Na", "Si", "P", "S", "Cl", "K", "Br", "I",
];
