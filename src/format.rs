//! Display formatting for counts and the gap headline.

use crate::metrics::{leader, Leader};

/// Placeholder for a value that has not been fetched yet
pub const UNKNOWN: &str = "--";

/// `6821` → `"6,821"`; `None` → `"--"`
pub fn format_number(value: Option<u64>) -> String {
    match value {
        Some(n) => group_digits(n),
        None => UNKNOWN.to_string(),
    }
}

fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Short form: `6821` → `"6.8K"`, `12345` → `"12K"`, `1_250_000` → `"1.3M"`.
///
/// One decimal is shown only below ten units.
pub fn format_compact(n: u64) -> String {
    const SUFFIXES: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

    if n < 1000 {
        return n.to_string();
    }

    let n = n as f64;
    let mut unit = SUFFIXES.len() - 1;
    while unit > 0 && n >= SUFFIXES[unit - 1].0 {
        unit -= 1;
    }

    let (scale, suffix) = SUFFIXES[unit];
    let value = n / scale;
    let rounded = if value < 10.0 {
        (value * 10.0).round() / 10.0
    } else {
        value.round()
    };

    // rounding can carry into the next unit (999_999 → 1000K)
    if rounded >= 1000.0 && unit > 0 {
        return format!("1{}", SUFFIXES[unit - 1].1);
    }

    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as u64, suffix)
    } else {
        format!("{:.1}{}", rounded, suffix)
    }
}

/// "nytimes leads by 271", "gemini leads by 12" or "Tied!"
pub fn gap_headline(gap: i64, incumbent: &str, challenger: &str) -> String {
    let amount = format_number(Some(gap.unsigned_abs()));
    match leader(gap) {
        Leader::Incumbent => format!("{} leads by {}", short_name(incumbent), amount),
        Leader::Challenger => format!("{} leads by {}", short_name(challenger), amount),
        Leader::Tied => "Tied!".to_string(),
    }
}

/// First label of a handle: `nytimes.com` → `nytimes`
pub fn short_name(handle: &str) -> &str {
    handle.split('.').next().unwrap_or(handle)
}
