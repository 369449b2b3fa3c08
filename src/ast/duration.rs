//! PromQL duration literals (`5m`, `1h30m`, `250ms`).

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:([0-9]+)y)?(?:([0-9]+)w)?(?:([0-9]+)d)?(?:([0-9]+)h)?(?:([0-9]+)m)?(?:([0-9]+)s)?(?:([0-9]+)ms)?$",
    )
    .expect("duration pattern is valid")
});

/// Largest duration that fits the millisecond range of an `i64`.
const MAX_MILLIS: u64 = i64::MAX as u64;

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;
const MS_PER_WEEK: u64 = 7 * MS_PER_DAY;
const MS_PER_YEAR: u64 = 365 * MS_PER_DAY;

/// Unit multipliers in the order the capture groups appear.
const UNITS: [u64; 7] = [
    MS_PER_YEAR,
    MS_PER_WEEK,
    MS_PER_DAY,
    MS_PER_HOUR,
    MS_PER_MINUTE,
    MS_PER_SECOND,
    1,
];

/// Parses a duration literal. Returns a message suitable for a parse error.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    match text {
        "0" => return Ok(Duration::ZERO),
        "" => return Err("empty duration string".to_string()),
        _ => {}
    }

    let caps = DURATION_RE
        .captures(text)
        .ok_or_else(|| format!("not a valid duration string: {text:?}"))?;

    let mut total: u64 = 0;
    for (i, mult) in UNITS.iter().enumerate() {
        let Some(m) = caps.get(i + 1) else { continue };
        let n: u64 = m
            .as_str()
            .parse()
            .map_err(|_| "duration out of range".to_string())?;
        total = n
            .checked_mul(*mult)
            .and_then(|ms| total.checked_add(ms))
            .filter(|ms| *ms <= MAX_MILLIS)
            .ok_or_else(|| "duration out of range".to_string())?;
    }
    Ok(Duration::from_millis(total))
}

/// Converts a plain number of seconds, as in `foo[300]`.
pub fn duration_from_secs(secs: f64) -> Result<Duration, String> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(format!("invalid duration {secs}"));
    }
    if secs * MS_PER_SECOND as f64 > MAX_MILLIS as f64 {
        return Err("duration out of range".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

/// Displays a duration in its canonical PromQL form, e.g. `1h30m`.
///
/// Years and weeks are only used when they divide the remainder exactly,
/// so 90 days prints as `90d` rather than `12w6d`.
pub struct DurationDisplay(pub Duration);

impl fmt::Display for DurationDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ms = self.0.as_millis();
        if ms == 0 {
            return f.write_str("0s");
        }

        let units: [(&str, u64, bool); 7] = [
            ("y", MS_PER_YEAR, true),
            ("w", MS_PER_WEEK, true),
            ("d", MS_PER_DAY, false),
            ("h", MS_PER_HOUR, false),
            ("m", MS_PER_MINUTE, false),
            ("s", MS_PER_SECOND, false),
            ("ms", 1, false),
        ];
        for (unit, mult, exact) in units {
            let mult = u128::from(mult);
            if exact && ms % mult != 0 {
                continue;
            }
            let v = ms / mult;
            if v > 0 {
                write!(f, "{v}{unit}")?;
                ms -= v * mult;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(ms: u64) -> String {
        DurationDisplay(Duration::from_millis(ms)).to_string()
    }

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration("5m"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("1y"), Ok(Duration::from_millis(MS_PER_YEAR)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("5min").is_err());
        assert!(parse_duration("1m1h").is_err());
        assert!(parse_duration("99999999999999999999y").is_err());
    }

    #[test]
    fn converts_plain_seconds() {
        assert_eq!(duration_from_secs(300.0), Ok(Duration::from_secs(300)));
        assert_eq!(duration_from_secs(1.5), Ok(Duration::from_millis(1500)));
        assert_eq!(duration_from_secs(1e17), Err("duration out of range".to_string()));
        assert!(duration_from_secs(-1.0).is_err());
        assert!(duration_from_secs(f64::NAN).is_err());
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(fmt(0), "0s");
        assert_eq!(fmt(300_000), "5m");
        assert_eq!(fmt(5_400_000), "1h30m");
        assert_eq!(fmt(1_500), "1s500ms");
        assert_eq!(fmt(MS_PER_WEEK), "1w");
        assert_eq!(fmt(8 * MS_PER_DAY), "8d");
        assert_eq!(fmt(90 * MS_PER_DAY), "90d");
        assert_eq!(fmt(MS_PER_YEAR), "1y");
    }
}
