//! Human-readable byte sizes.

use std::fmt;

/// Step between two consecutive units.
pub const UNIT_STEP: u64 = 1024;

/// Display unit for a byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    PB,
    EB,
}

impl SizeUnit {
    /// All units in ascending order.
    pub const ALL: [SizeUnit; 7] = [
        SizeUnit::B,
        SizeUnit::KB,
        SizeUnit::MB,
        SizeUnit::GB,
        SizeUnit::TB,
        SizeUnit::PB,
        SizeUnit::EB,
    ];

    /// Unit symbol as printed after the value.
    pub fn symbol(self) -> &'static str {
        match self {
            SizeUnit::B => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
            SizeUnit::TB => "TB",
            SizeUnit::PB => "PB",
            SizeUnit::EB => "EB",
        }
    }

    /// Number of bytes in one of this unit.
    pub fn bytes(self) -> u64 {
        UNIT_STEP.pow(self as u32)
    }

    /// Pick the unit and divisor used to display `size`.
    ///
    /// Divides by 1024 while the next quotient would still be at least 1024,
    /// capped at `EB`.
    pub fn for_size(size: u64) -> (SizeUnit, u64) {
        if size < UNIT_STEP {
            return (SizeUnit::B, 1);
        }

        let mut divisor = UNIT_STEP;
        let mut index = 1;
        let mut quotient = size / UNIT_STEP;
        while quotient >= UNIT_STEP && index < Self::ALL.len() - 1 {
            divisor *= UNIT_STEP;
            quotient /= UNIT_STEP;
            index += 1;
        }

        (Self::ALL[index], divisor)
    }

    fn from_symbol(symbol: &str) -> Option<SizeUnit> {
        Self::ALL.into_iter().find(|u| u.symbol() == symbol)
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Format a byte count, e.g. `512 B`, `1.5 KB`, `1.0 GB`.
///
/// Counts below 1024 are printed exactly. Larger counts are printed with one
/// decimal place in the largest unit that keeps the quotient at or above 1.
pub fn format_size(size: u64) -> String {
    match SizeUnit::for_size(size) {
        (SizeUnit::B, _) => format!("{size} B"),
        (unit, divisor) => format!("{:.1} {}", size as f64 / divisor as f64, unit),
    }
}

/// Parse a string produced by [`format_size`] back into bytes.
///
/// The result is within one printed decimal step of the input count.
pub fn parse_size(s: &str) -> Option<u64> {
    let (value, symbol) = s.trim().split_once(' ')?;
    let unit = SizeUnit::from_symbol(symbol.trim())?;

    if unit == SizeUnit::B {
        return value.parse().ok();
    }

    let value: f64 = value.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * unit.bytes() as f64).round() as u64)
}
