use std::borrow::Cow;

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Calculates the display width of a string in terminal columns.
///
/// Handles Unicode correctly: CJK characters and emoji occupy two columns,
/// combining marks occupy zero, plain ASCII occupies one.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within a maximum display width.
///
/// Appends "..." when text is cut off. Width accounting is Unicode-aware so
/// wide characters never overflow the column budget. Returns `Cow::Borrowed`
/// when the string already fits.
///
/// Widths of 3 or fewer columns return as many characters as fit without an
/// ellipsis, since there is no room for "char + ellipsis".
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    if max_width <= ELLIPSIS_WIDTH {
        let mut byte_end = 0;
        let mut current = 0;
        for (idx, c) in s.char_indices() {
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if current + w > max_width {
                break;
            }
            current += w;
            byte_end = idx + c.len_utf8();
        }
        if byte_end == s.len() {
            return Cow::Borrowed(s);
        }
        return Cow::Owned(s[..byte_end].to_string());
    }

    let target = max_width - ELLIPSIS_WIDTH;
    let mut current = 0;
    let mut cut_point = None;
    let mut exceeded = false;

    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if cut_point.is_none() && current + w > target {
            cut_point = Some(idx);
        }
        if current + w > max_width {
            exceeded = true;
            break;
        }
        current += w;
    }

    if exceeded {
        let cut = cut_point.unwrap_or(s.len());
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    } else {
        Cow::Borrowed(s)
    }
}

/// Format a count the way video platforms render view/like totals:
/// `950` stays as-is, `12_400` becomes "12K", `1_230_000` becomes "1.2M".
///
/// One decimal place is kept below 10 of a unit, dropped above (matching
/// "1.2M" but "12M").
pub fn format_compact_count(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for (scale, suffix) in UNITS {
        if n >= scale {
            let whole = n / scale;
            if whole >= 10 {
                return format!("{}{}", whole, suffix);
            }
            let tenths = (n % scale) * 10 / scale;
            if tenths == 0 {
                return format!("{}{}", whole, suffix);
            }
            return format!("{}.{}{}", whole, tenths, suffix);
        }
    }
    n.to_string()
}

/// Render a publish timestamp relative to `now`: "just now", "5 minutes ago",
/// "3 days ago", "2 years ago".
///
/// Future timestamps (clock skew on the catalog side) render as "just now".
pub fn relative_time(published_at: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - *published_at).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }

    let (amount, unit) = if secs < 3_600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3_600, "hour")
    } else if secs < 2_592_000 {
        (secs / 86_400, "day")
    } else if secs < 31_536_000 {
        (secs / 2_592_000, "month")
    } else {
        (secs / 31_536_000, "year")
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}
