//! Resolving and prompting for the listing date range

use chrono::{Duration, NaiveDate};
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use crate::models::{DateRange, MarketIndex, DATE_FORMAT};

/// A change applied to the requested dates while resolving the range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateAdjustment {
    DefaultFrom(NaiveDate),
    DefaultTo(NaiveDate),
    FromInFuture(NaiveDate),
    ToInFuture(NaiveDate),
    ToBeforeFrom(NaiveDate),
}

impl fmt::Display for DateAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateAdjustment::DefaultFrom(d) => {
                write!(f, "Using default 'From' date: {}", d.format(DATE_FORMAT))
            }
            DateAdjustment::DefaultTo(d) => {
                write!(f, "Using default 'To' date: {}", d.format(DATE_FORMAT))
            }
            DateAdjustment::FromInFuture(d) => write!(
                f,
                "From date cannot be in the future. Setting it to today's date ({})",
                d.format(DATE_FORMAT)
            ),
            DateAdjustment::ToInFuture(d) => write!(
                f,
                "To date cannot be in the future. Setting it to today's date ({})",
                d.format(DATE_FORMAT)
            ),
            DateAdjustment::ToBeforeFrom(d) => write!(
                f,
                "To date cannot be before the From date. Setting it to the From date ({})",
                d.format(DATE_FORMAT)
            ),
        }
    }
}

/// Default lookback when no start date is given
pub fn one_year_before(today: NaiveDate) -> NaiveDate {
    today - Duration::days(365)
}

pub fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
}

/// `clap` value parser for `dd-mm-yyyy` arguments
pub fn parse_cli_date(input: &str) -> Result<NaiveDate, String> {
    parse_date(input).map_err(|_| format!("Incorrect date format '{}'. Use dd-mm-yyyy", input))
}

/// Fill in defaults and clamp the requested dates to a valid range
pub fn resolve(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> (DateRange, Vec<DateAdjustment>) {
    let mut adjustments = Vec::new();

    let from = match from {
        None => {
            let default = one_year_before(today);
            adjustments.push(DateAdjustment::DefaultFrom(default));
            default
        }
        Some(date) if date > today => {
            adjustments.push(DateAdjustment::FromInFuture(today));
            today
        }
        Some(date) => date,
    };

    let mut to = match to {
        None => {
            adjustments.push(DateAdjustment::DefaultTo(today));
            today
        }
        Some(date) if date > today => {
            adjustments.push(DateAdjustment::ToInFuture(today));
            today
        }
        Some(date) => date,
    };

    if to < from {
        adjustments.push(DateAdjustment::ToBeforeFrom(from));
        to = from;
    }

    for adjustment in &adjustments {
        match adjustment {
            DateAdjustment::DefaultFrom(_) | DateAdjustment::DefaultTo(_) => {
                info!("{}", adjustment)
            }
            _ => warn!("{}", adjustment),
        }
    }

    (DateRange { from, to }, adjustments)
}

/// Ask for a date until a valid one or an empty line (meaning "default") is entered
pub fn prompt_date<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<Option<NaiveDate>> {
    loop {
        writeln!(output, "{}", prompt)?;
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        match parse_date(line) {
            Ok(date) => return Ok(Some(date)),
            Err(_) => writeln!(output, "Incorrect date format. Please enter date in dd-mm-yyyy format.")?,
        }
    }
}

/// Numbered menu of market indices; an empty answer selects the first
pub fn prompt_index<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<MarketIndex> {
    loop {
        writeln!(output, "Select an Index:")?;
        for (i, index) in MarketIndex::ALL.iter().enumerate() {
            writeln!(output, "{}. {}", i + 1, index.label())?;
        }
        write!(output, "Enter the index of the option: ")?;
        output.flush()?;

        let mut line = String::new();
        let eof = input.read_line(&mut line)? == 0;
        let line = line.trim();
        if eof || line.is_empty() {
            writeln!(output, "(Selecting the first option as default.)")?;
            return Ok(MarketIndex::ALL[0]);
        }

        match line.parse::<usize>() {
            Ok(n) if (1..=MarketIndex::ALL.len()).contains(&n) => return Ok(MarketIndex::ALL[n - 1]),
            _ => writeln!(output, "Invalid option. Please select a valid number.")?,
        }
    }
}

/// Interactive date range selection, resolved against `today`
pub fn prompt_range<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    today: NaiveDate,
) -> io::Result<(DateRange, Vec<DateAdjustment>)> {
    let from = prompt_date(
        input,
        output,
        &format!(
            "Please enter the 'From' date (dd-mm-yyyy), or leave empty for one year ago ({}):",
            one_year_before(today).format(DATE_FORMAT)
        ),
    )?;
    let to = prompt_date(
        input,
        output,
        &format!(
            "Please enter the 'To' date (dd-mm-yyyy), or leave empty for today ({}):",
            today.format(DATE_FORMAT)
        ),
    )?;

    let (range, adjustments) = resolve(from, to, today);
    for adjustment in &adjustments {
        writeln!(output, "{}", adjustment)?;
    }
    Ok((range, adjustments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn date(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_format() {
        assert_eq!(parse_date("05-03-2024").unwrap(), date(5, 3, 2024));
        assert!(parse_date("2024-03-05").is_err());
        assert!(parse_cli_date("31-02-2024").is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let today = date(15, 6, 2024);
        let (range, adjustments) = resolve(None, None, today);

        assert_eq!(range.from, date(16, 6, 2023));
        assert_eq!(range.to, today);
        assert_eq!(
            adjustments,
            vec![DateAdjustment::DefaultFrom(date(16, 6, 2023)), DateAdjustment::DefaultTo(today)]
        );
    }

    #[test]
    fn test_resolve_clamps_future_dates() {
        let today = date(15, 6, 2024);
        let (range, adjustments) = resolve(Some(date(1, 1, 2030)), Some(date(2, 1, 2030)), today);

        assert_eq!(range, DateRange { from: today, to: today });
        assert_eq!(
            adjustments,
            vec![DateAdjustment::FromInFuture(today), DateAdjustment::ToInFuture(today)]
        );
    }

    #[test]
    fn test_resolve_to_before_from() {
        let today = date(15, 6, 2024);
        let (range, adjustments) = resolve(Some(date(1, 5, 2024)), Some(date(1, 4, 2024)), today);

        assert_eq!(range.to, date(1, 5, 2024));
        assert_eq!(adjustments, vec![DateAdjustment::ToBeforeFrom(date(1, 5, 2024))]);
    }

    #[test]
    fn test_resolve_valid_range_untouched() {
        let today = date(15, 6, 2024);
        let (range, adjustments) = resolve(Some(date(1, 1, 2024)), Some(date(1, 2, 2024)), today);

        assert_eq!(range, DateRange { from: date(1, 1, 2024), to: date(1, 2, 2024) });
        assert!(adjustments.is_empty());
    }

    #[test]
    fn test_prompt_date_retries_until_valid() {
        let mut input = Cursor::new("2024/01/01\n01-01-2024\n");
        let mut output = Vec::new();

        let parsed = prompt_date(&mut input, &mut output, "From?").unwrap();

        assert_eq!(parsed, Some(date(1, 1, 2024)));
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Incorrect date format"));
    }

    #[test]
    fn test_prompt_date_empty_and_eof_mean_default() {
        let mut output = Vec::new();
        assert_eq!(prompt_date(&mut Cursor::new("\n"), &mut output, "From?").unwrap(), None);
        assert_eq!(prompt_date(&mut Cursor::new(""), &mut output, "From?").unwrap(), None);
    }

    #[test]
    fn test_prompt_index() {
        let mut output = Vec::new();
        let chosen = prompt_index(&mut Cursor::new("7\nabc\n1\n"), &mut output).unwrap();
        assert_eq!(chosen, MarketIndex::Equities);
        assert_eq!(
            String::from_utf8(output).unwrap().matches("Invalid option").count(),
            2
        );

        let mut output = Vec::new();
        assert_eq!(prompt_index(&mut Cursor::new("\n"), &mut output).unwrap(), MarketIndex::Equities);
    }

    #[test]
    fn test_prompt_range() {
        let today = date(15, 6, 2024);
        let mut output = Vec::new();
        let (range, adjustments) =
            prompt_range(&mut Cursor::new("01-06-2024\n01-01-2024\n"), &mut output, today).unwrap();

        assert_eq!(range, DateRange { from: date(1, 6, 2024), to: date(1, 6, 2024) });
        assert_eq!(adjustments.len(), 1);
    }
}
