//! Natural-language reminder times.
//!
//! Recognized forms (case-insensitive, Russian or English):
//! - `через 2 часа`, `через 30 минут`, `через 3 дня`, `in 2 hours`
//!   (the number may be omitted: `через час`)
//! - `18:30`: today, or tomorrow when that moment has already passed
//! - `2024-12-25 18:30`
//! - `завтра 09:00`, `завтра в 09:00`, `tomorrow 9:00`, `tomorrow at 9:00`

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Longest time phrase considered by [`split_time_and_text`].
pub const MAX_TIME_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Minutes,
    Hours,
    Days,
}

impl Unit {
    fn from_word(word: &str) -> Option<Self> {
        let w = word.trim_end_matches('.');
        if w.starts_with("мин") || w.starts_with("min") {
            Some(Self::Minutes)
        } else if w.starts_with("час") || w.starts_with("hour") || w == "h" || w == "ч" {
            Some(Self::Hours)
        } else if matches!(w, "день" | "дня" | "дней" | "сутки" | "суток")
            || w.starts_with("day")
        {
            Some(Self::Days)
        } else {
            None
        }
    }

    fn duration(self, n: i64) -> Option<Duration> {
        match self {
            Self::Minutes => Duration::try_minutes(n),
            Self::Hours => Duration::try_hours(n),
            Self::Days => Duration::try_days(n),
        }
    }
}

/// Parse a time phrase relative to `now`. Returns `None` when the phrase is
/// not one of the recognized forms.
pub fn parse_reminder_time(input: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let lowered = input.trim().to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    match words.as_slice() {
        ["через" | "in", rest @ ..] => parse_relative(rest, now),
        ["завтра" | "tomorrow", "в" | "at", time] | ["завтра" | "tomorrow", time] => {
            let t = parse_clock(time)?;
            Some(now.date().succ_opt()?.and_time(t))
        }
        [date, time] => {
            let d = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
            Some(d.and_time(parse_clock(time)?))
        }
        [time] => {
            let t = parse_clock(time)?;
            let today = now.date().and_time(t);
            if today < now {
                Some(now.date().succ_opt()?.and_time(t))
            } else {
                Some(today)
            }
        }
        _ => None,
    }
}

fn parse_relative(rest: &[&str], now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (amount, unit) = match rest {
        [n, unit] => (n.parse::<i64>().ok()?, Unit::from_word(unit)?),
        [unit] => (1, Unit::from_word(unit)?),
        _ => return None,
    };
    if amount < 0 {
        return None;
    }
    now.checked_add_signed(unit.duration(amount)?)
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    if !s.contains(':') {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

/// Split leading words into a time phrase and the remaining text.
///
/// The longest prefix of up to [`MAX_TIME_WORDS`] words that parses wins,
/// so `через 2 часа позвонить` yields the full three-word phrase rather than
/// stopping early.
pub fn split_time_and_text(words: &[&str], now: NaiveDateTime) -> Option<(NaiveDateTime, String)> {
    let longest = MAX_TIME_WORDS.min(words.len());
    (1..=longest).rev().find_map(|n| {
        let phrase = words[..n].join(" ");
        parse_reminder_time(&phrase, now).map(|due| (due, words[n..].join(" ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-10 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_relative_russian() {
        assert_eq!(parse_reminder_time("через 30 минут", now()), Some(at("2025-01-10 12:30")));
        assert_eq!(parse_reminder_time("через 2 часа", now()), Some(at("2025-01-10 14:00")));
        assert_eq!(parse_reminder_time("через 5 часов", now()), Some(at("2025-01-10 17:00")));
        assert_eq!(parse_reminder_time("через 3 дня", now()), Some(at("2025-01-13 12:00")));
        assert_eq!(parse_reminder_time("Через час", now()), Some(at("2025-01-10 13:00")));
    }

    #[test]
    fn test_relative_english() {
        assert_eq!(parse_reminder_time("in 15 minutes", now()), Some(at("2025-01-10 12:15")));
        assert_eq!(parse_reminder_time("in 1 day", now()), Some(at("2025-01-11 12:00")));
    }

    #[test]
    fn test_clock_today_or_tomorrow() {
        assert_eq!(parse_reminder_time("18:30", now()), Some(at("2025-01-10 18:30")));
        assert_eq!(parse_reminder_time("09:00", now()), Some(at("2025-01-11 09:00")));
        assert_eq!(parse_reminder_time("12:00", now()), Some(at("2025-01-10 12:00")));
    }

    #[test]
    fn test_absolute_and_tomorrow() {
        assert_eq!(
            parse_reminder_time("2024-12-25 18:30", now()),
            Some(at("2024-12-25 18:30"))
        );
        assert_eq!(parse_reminder_time("завтра 09:00", now()), Some(at("2025-01-11 09:00")));
        assert_eq!(parse_reminder_time("завтра в 9:15", now()), Some(at("2025-01-11 09:15")));
        assert_eq!(parse_reminder_time("tomorrow at 07:45", now()), Some(at("2025-01-11 07:45")));
    }

    #[test]
    fn test_unrecognized() {
        for input in ["", "купить хлеб", "25:00", "через много минут", "через 2 недели", "завтра"] {
            assert_eq!(parse_reminder_time(input, now()), None, "input: {input}");
        }
    }

    #[test]
    fn test_split_prefers_longest_prefix() {
        let words = ["через", "2", "часа", "проверить", "почту"];
        let (due, text) = split_time_and_text(&words, now()).unwrap();
        assert_eq!(due, at("2025-01-10 14:00"));
        assert_eq!(text, "проверить почту");

        let words = ["2024-12-25", "10:00", "Совещание"];
        let (due, text) = split_time_and_text(&words, now()).unwrap();
        assert_eq!(due, at("2024-12-25 10:00"));
        assert_eq!(text, "Совещание");
    }

    #[test]
    fn test_split_single_word_time() {
        let (due, text) = split_time_and_text(&["18:30", "ужин"], now()).unwrap();
        assert_eq!(due, at("2025-01-10 18:30"));
        assert_eq!(text, "ужин");
        assert!(split_time_and_text(&["ужин", "18:30"], now()).is_none());
        assert!(split_time_and_text(&[], now()).is_none());
    }
}
