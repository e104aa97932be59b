//! Fixed-point display of cell values.

/// How numbers are shown in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFormat {
    /// Show times (not ratios) in milliseconds instead of seconds
    pub millis: bool,
    /// Number of digits after the dot; values are truncated, not
    /// rounded
    pub digits: usize,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            millis: false,
            digits: 10,
        }
    }
}

/// Placeholder for a time that was not measured.
pub const MISSING: &str = "-";

/// Cut `value` to `digits` fractional digits without rounding, keeping
/// the whole integer part. Works on the shortest decimal
/// representation that round-trips, so that e.g. 2.3 does not turn
/// into 2.29.
pub fn truncate_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    // `Display` for f64 never uses exponent notation
    let s = value.to_string();
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
    if digits == 0 {
        return int_part.to_string();
    }
    let mut out = String::with_capacity(int_part.len() + 1 + digits);
    out.push_str(int_part);
    out.push('.');
    out.extend(frac_part.chars().chain(std::iter::repeat('0')).take(digits));
    out
}

impl TimeFormat {
    /// A measured time in seconds, or the placeholder if missing.
    pub fn time(&self, seconds: Option<f64>) -> String {
        match seconds {
            None => MISSING.into(),
            Some(t) => {
                let t = if self.millis { t * 1000.0 } else { t };
                truncate_fixed(t, self.digits)
            }
        }
    }

    /// A dimensionless value; never scaled to milliseconds.
    pub fn ratio(&self, value: f64) -> String {
        truncate_fixed(value, self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_truncate_fixed() {
        assert_eq!(truncate_fixed(2.0, 1), "2.0");
        assert_eq!(truncate_fixed(1.234, 2), "1.23");
        assert_eq!(truncate_fixed(1.239, 2), "1.23");
        assert_eq!(truncate_fixed(2.3, 2), "2.30");
        assert_eq!(truncate_fixed(9.999, 2), "9.99");
        assert_eq!(truncate_fixed(12345.678, 0), "12345");
        assert_eq!(truncate_fixed(0.0, 3), "0.000");
        assert_eq!(truncate_fixed(-1.25, 1), "-1.2");
        assert_eq!(truncate_fixed(0.0000001, 8), "0.00000010");
        assert_eq!(truncate_fixed(1e20, 1), "100000000000000000000.0");
        assert_eq!(truncate_fixed(f64::INFINITY, 2), "inf");
    }

    #[test]
    fn t_time() {
        let f = TimeFormat {
            millis: false,
            digits: 3,
        };
        assert_eq!(f.time(None), "-");
        assert_eq!(f.time(Some(1.23456)), "1.234");
        assert_eq!(f.time(Some(0.0)), "0.000");
        let ms = TimeFormat {
            millis: true,
            digits: 1,
        };
        assert_eq!(ms.time(Some(1.5)), "1500.0");
        assert_eq!(ms.ratio(1.5), "1.5");
    }

    #[test]
    fn t_default() {
        assert_eq!(TimeFormat::default().time(Some(2.0)), "2.0000000000");
    }
}
