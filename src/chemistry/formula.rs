use std::fmt;
use std::str::FromStr;

use super::elements;
use super::FormulaError;

/// Symbols that stand for a unit of charge rather than an element
const CHARGE_TOKENS: [&str; 2] = ["+", "-"];

/// Molecular formula with optional charge tokens, e.g. `C6H13O6+`.
///
/// Symbols keep their first-seen order; repeated symbols accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formula {
    counts: Vec<(String, u32)>,
}

impl Formula {
    /// Parse `Symbol[count]` tokens, where a symbol is an element
    /// (`[A-Z][a-z]*`) or a charge sign (`+`, `-`).
    pub fn parse(text: &str) -> Result<Self, FormulaError> {
        let mut formula = Formula::default();
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let start = i;
            let c = chars[i];
            if c.is_ascii_uppercase() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_lowercase() {
                    i += 1;
                }
            } else if c == '+' || c == '-' {
                i += 1;
            } else {
                let fragment: String = chars[i..]
                    .iter()
                    .take_while(|c| !c.is_ascii_uppercase() && **c != '+' && **c != '-')
                    .collect();
                return Err(FormulaError::InvalidSyntax {
                    formula: text.to_string(),
                    fragment,
                });
            }
            let symbol: String = chars[start..i].iter().collect();

            let digits_start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let digits: String = chars[digits_start..i].iter().collect();
            let count = if digits.is_empty() {
                1
            } else {
                digits
                    .parse::<u32>()
                    .map_err(|_| FormulaError::CountOverflow {
                        formula: text.to_string(),
                        count: digits.clone(),
                    })?
            };
            formula.add_count(&symbol, count);
        }
        Ok(formula)
    }

    fn add_count(&mut self, symbol: &str, n: u32) {
        match self.counts.iter_mut().find(|(s, _)| s == symbol) {
            Some((_, count)) => *count = count.saturating_add(n),
            None => self.counts.push((symbol.to_string(), n)),
        }
    }

    /// Atom (or charge token) count of a symbol
    pub fn count(&self, symbol: &str) -> u32 {
        self.counts
            .iter()
            .find(|(s, _)| s == symbol)
            .map_or(0, |(_, n)| *n)
    }

    /// Element symbols and counts, charge tokens excluded
    pub fn elements(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts
            .iter()
            .filter(|(s, _)| !CHARGE_TOKENS.contains(&s.as_str()))
            .map(|(s, n)| (s.as_str(), *n))
    }

    /// Whether the formula holds nothing
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count of `+` tokens minus count of `-` tokens
    pub fn net_charge(&self) -> Result<i32, FormulaError> {
        let net = i64::from(self.count("+")) - i64::from(self.count("-"));
        i32::try_from(net).map_err(|_| FormulaError::ChargeOverflow { net })
    }

    /// Sum of the most abundant isotope masses, charge tokens massless
    pub fn exact_mass(&self) -> Result<f64, FormulaError> {
        self.elements().try_fold(0.0, |acc, (symbol, n)| {
            let mass = elements::most_abundant_mass(symbol).ok_or_else(|| {
                FormulaError::UnknownElement {
                    symbol: symbol.to_string(),
                }
            })?;
            Ok(acc + mass * n as f64)
        })
    }

    /// Every count multiplied by `n`
    pub fn scaled(&self, n: u32) -> Formula {
        Formula {
            counts: self
                .counts
                .iter()
                .map(|(s, c)| (s.clone(), c.saturating_mul(n)))
                .collect(),
        }
    }

    /// Add another formula; opposite charge tokens cancel
    pub fn add(&mut self, other: &Formula) {
        for (symbol, n) in &other.counts {
            self.add_count(symbol, *n);
        }
        self.cancel_charges();
    }

    /// Remove another formula; removing a charge adds the opposite one
    pub fn subtract(&mut self, other: &Formula) -> Result<(), FormulaError> {
        for (symbol, n) in &other.counts {
            match symbol.as_str() {
                "+" => self.add_count("-", *n),
                "-" => self.add_count("+", *n),
                _ => {
                    let available = self.count(symbol);
                    if available < *n {
                        return Err(FormulaError::NegativeCount {
                            symbol: symbol.clone(),
                            available,
                            requested: *n,
                        });
                    }
                    self.set_count(symbol, available - n);
                }
            }
        }
        self.cancel_charges();
        Ok(())
    }

    fn set_count(&mut self, symbol: &str, n: u32) {
        if n == 0 {
            self.counts.retain(|(s, _)| s != symbol);
        } else if let Some((_, count)) = self.counts.iter_mut().find(|(s, _)| s == symbol) {
            *count = n;
        } else {
            self.counts.push((symbol.to_string(), n));
        }
    }

    fn cancel_charges(&mut self) {
        let (plus, minus) = (self.count("+"), self.count("-"));
        let common = plus.min(minus);
        if common > 0 {
            self.set_count("+", plus - common);
            self.set_count("-", minus - common);
        }
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, n) in &self.counts {
            if *n > 1 {
                write!(f, "{symbol}{n}")?;
            } else {
                f.write_str(symbol)?;
            }
        }
        Ok(())
    }
}

/// Adduct notation such as `[M+H]+`, `[M-2H+Na]-` or `[M+2H]2+`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adduct {
    notation: String,
    added: Formula,
    removed: Formula,
    charge: Formula,
}

impl Adduct {
    /// Parse `[M<+|-><n?><group>...]<n?><+|->`
    pub fn parse(notation: &str) -> Result<Self, FormulaError> {
        let invalid = || FormulaError::InvalidAdduct(notation.to_string());
        let body = notation.strip_prefix("[M").ok_or_else(invalid)?;
        let close = body.rfind(']').ok_or_else(invalid)?;
        let (groups, tail) = (&body[..close], &body[close + 1..]);

        let sign = tail.chars().last().ok_or_else(invalid)?;
        if sign != '+' && sign != '-' {
            return Err(invalid());
        }
        let digits = &tail[..tail.len() - 1];
        let magnitude = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|_| invalid())?
        };
        let mut charge = Formula::default();
        charge.add_count(&sign.to_string(), magnitude);

        let mut added = Formula::default();
        let mut removed = Formula::default();
        let mut rest = groups;
        while let Some(op) = rest.chars().next() {
            if op != '+' && op != '-' {
                return Err(invalid());
            }
            let group_end = rest[1..]
                .find(['+', '-'])
                .map_or(rest.len(), |p| p + 1);
            let group = &rest[1..group_end];
            let split = group
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(invalid)?;
            let multiplier = if split == 0 {
                1
            } else {
                group[..split].parse::<u32>().map_err(|_| invalid())?
            };
            let formula = Formula::parse(&group[split..])?.scaled(multiplier);
            if op == '+' {
                added.add(&formula);
            } else {
                removed.add(&formula);
            }
            rest = &rest[group_end..];
        }

        Ok(Self {
            notation: notation.to_string(),
            added,
            removed,
            charge,
        })
    }

    /// Notation as given
    pub fn notation(&self) -> &str {
        &self.notation
    }

    /// Net charge of the ion
    pub fn charge(&self) -> Result<i32, FormulaError> {
        self.charge.net_charge()
    }

    /// Ion formula of molecule `m` with this adduct
    pub fn apply(&self, m: &Formula) -> Result<Formula, FormulaError> {
        let mut ion = m.clone();
        ion.add(&self.added);
        ion.subtract(&self.removed)?;
        ion.add(&self.charge);
        Ok(ion)
    }
}

impl FromStr for Adduct {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Adduct::parse(s)
    }
}
