use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

/// One row of the `customers` relation.
///
/// `birth_date` stays the raw stored text; it is parsed lazily wherever a
/// calendar date is actually needed so that one malformed row never fails a
/// whole snapshot load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub average_ticket_hint: Option<Decimal>,
}

impl Customer {
    /// Joined first/last name, falling back to a placeholder when both parts
    /// are blank.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let joined = format!("{first} {last}");
        let joined = joined.trim();
        if joined.is_empty() {
            "Unnamed customer".to_string()
        } else {
            joined.to_string()
        }
    }

    /// Lenient calendar-date parse of the stored birth date.
    ///
    /// Accepts ISO dates, day-first numeric forms, and full RFC 3339
    /// timestamps. Anything else is `None`, never an error.
    pub fn parsed_birth_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(self.birth_date.as_deref()?)
    }
}

pub(crate) fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    chrono::DateTime::parse_from_rfc3339(trimmed).map(|ts| ts.date_naive()).ok()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_calendar_date, Customer, CustomerId};

    fn customer(first: Option<&str>, last: Option<&str>) -> Customer {
        Customer {
            id: CustomerId(1),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: None,
            phone: None,
            birth_date: None,
            average_ticket_hint: None,
        }
    }

    #[test]
    fn display_name_joins_and_trims_name_parts() {
        assert_eq!(customer(Some("Ada"), Some("Moreno")).display_name(), "Ada Moreno");
        assert_eq!(customer(Some("  Ada  "), None).display_name(), "Ada");
        assert_eq!(customer(None, Some("Moreno")).display_name(), "Moreno");
    }

    #[test]
    fn display_name_falls_back_when_both_parts_blank() {
        assert_eq!(customer(None, None).display_name(), "Unnamed customer");
        assert_eq!(customer(Some("  "), Some("")).display_name(), "Unnamed customer");
    }

    #[test]
    fn birth_dates_parse_from_iso_day_first_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(1990, 4, 12);
        assert_eq!(parse_calendar_date("1990-04-12"), expected);
        assert_eq!(parse_calendar_date("12/04/1990"), expected);
        assert_eq!(parse_calendar_date("12-04-1990"), expected);
        assert_eq!(parse_calendar_date("1990/04/12"), expected);
        assert_eq!(parse_calendar_date("1990-04-12T08:30:00Z"), expected);
    }

    #[test]
    fn malformed_birth_dates_are_none_not_errors() {
        assert_eq!(parse_calendar_date("not-a-date"), None);
        assert_eq!(parse_calendar_date(""), None);
        assert_eq!(parse_calendar_date("1990-13-40"), None);
    }
}
