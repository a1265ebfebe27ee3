//! Sizes as the service prints them, e.g. `95.0 M` or `1,024 K`.

use std::sync::OnceLock;

use regex::Regex;

pub const DEFAULT_STEP: u64 = 1024;

/// A missing unit means bytes. Text that does not look like a size, or a
/// `step` below 2, yields `None`.
pub fn size_to_byte(size: &str, step: u64) -> Option<u64> {
    static SIZE_RE: OnceLock<Regex> = OnceLock::new();

    if step < 2 {
        return None;
    }
    if size.is_empty() {
        return Some(0);
    }

    let normalized = size.to_lowercase().replace([' ', ','], "");
    let caps = SIZE_RE
        .get_or_init(|| Regex::new(r"^(\d+\.?\d*)([bkmgt]?)$").unwrap())
        .captures(&normalized)?;

    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    let exponent = match caps.get(2).map_or("", |m| m.as_str()) {
        "" | "b" => 0,
        "k" => 1,
        "m" => 2,
        "g" => 3,
        _ => 4,
    };

    Some((number * step.checked_pow(exponent)? as f64) as u64)
}

/// `0` below one kilobyte, otherwise two truncated decimals and a unit.
/// Terabyte values are still shown in `G`.
pub fn byte_to_size(bytes: u64, step: u64) -> Option<String> {
    if step < 2 {
        return None;
    }

    let bytes = u128::from(bytes);
    let step = u128::from(step);
    let (unit, per) = if bytes < step {
        return Some("0".into());
    } else if bytes < step.pow(2) {
        ("K", step)
    } else if bytes < step.pow(3) {
        ("M", step.pow(2))
    } else {
        ("G", step.pow(3))
    };

    let hundredths = bytes * 100 / per;
    Some(format!("{}.{:02} {unit}", hundredths / 100, hundredths % 100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_sizes() {
        assert_eq!(size_to_byte("95.0 M", DEFAULT_STEP), Some(95 * 1024 * 1024));
        assert_eq!(size_to_byte("1,024 K", DEFAULT_STEP), Some(1024 * 1024));
        assert_eq!(size_to_byte("1.5k", DEFAULT_STEP), Some(1536));
        assert_eq!(size_to_byte("2 T", 1000), Some(2_000_000_000_000));
        assert_eq!(size_to_byte("512", DEFAULT_STEP), Some(512));
        assert_eq!(size_to_byte("", DEFAULT_STEP), Some(0));
    }

    #[test]
    fn should_refuse_unknown_units() {
        assert_eq!(size_to_byte("12 MB", DEFAULT_STEP), None);
        assert_eq!(size_to_byte("big", DEFAULT_STEP), None);
        assert_eq!(size_to_byte("1.2.3k", DEFAULT_STEP), None);
    }

    #[test]
    fn should_print_sizes() {
        assert_eq!(byte_to_size(1000, DEFAULT_STEP).as_deref(), Some("0"));
        assert_eq!(byte_to_size(1536, DEFAULT_STEP).as_deref(), Some("1.50 K"));
        assert_eq!(
            byte_to_size(95 * 1024 * 1024 + 1023, DEFAULT_STEP).as_deref(),
            Some("95.00 M")
        );
        assert_eq!(byte_to_size(1_999_999, 1000).as_deref(), Some("1.99 M"));
        assert_eq!(
            byte_to_size(5 * 1024u64.pow(4), DEFAULT_STEP).as_deref(),
            Some("5120.00 G")
        );
    }

    #[test]
    fn should_reject_degenerate_steps() {
        assert_eq!(byte_to_size(5, 0), None);
        assert_eq!(byte_to_size(5, 1), None);
        assert_eq!(size_to_byte("1 K", 0), None);
        assert_eq!(size_to_byte("1 T", 1 << 20), None);
        assert_eq!(
            byte_to_size(u64::MAX, 1 << 32).as_deref(),
            Some("4294967295.99 K")
        );
    }
}
