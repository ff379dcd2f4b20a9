//! Export serialization
//!
//! CSV follows RFC 4180: every field is quoted, embedded quotes are doubled
//! and records end with CRLF.

use chrono::{DateTime, SecondsFormat, Utc};

use super::service::ReportWindow;
use crate::domain::Visitor;

pub const CSV_HEADER: [&str; 7] = ["Name", "Phone", "Owner", "Flat", "Status", "Bike Number", "Date"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: Option<&str>) -> Option<Self> {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Full filtered result set plus what the caller needs to name and stamp it.
#[derive(Debug)]
pub struct VisitorExport {
    pub visitors: Vec<Visitor>,
    pub window: ReportWindow,
    pub exported_at: DateTime<Utc>,
}

impl VisitorExport {
    /// `visitors-<first day>-to-<last day>.<ext>`
    pub fn filename(&self, format: ExportFormat) -> String {
        format!(
            "visitors-{}-to-{}.{}",
            self.window.first_day.format("%Y-%m-%d"),
            self.window.last_day.format("%Y-%m-%d"),
            format.extension()
        )
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_record(&mut out, CSV_HEADER.iter().copied());
        for v in &self.visitors {
            let date = v.created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
            push_record(
                &mut out,
                [
                    v.details.visitor_name.as_str(),
                    v.details.visitor_phone.as_str(),
                    v.details.owner_name.as_str(),
                    v.details.flat_no.as_str(),
                    v.status.as_str(),
                    v.bike_number.as_str(),
                    date.as_str(),
                ],
            );
        }
        out
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewVisitor, VisitorDetails};
    use chrono::{NaiveDate, TimeZone};

    /// Minimal RFC 4180 reader for checking the writer.
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, in_quotes) {
                ('"', true) if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                ('"', _) => in_quotes = !in_quotes,
                (',', false) => row.push(std::mem::take(&mut field)),
                ('\r', false) => {}
                ('\n', false) => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                (c, _) => field.push(c),
            }
        }
        rows
    }

    fn visitor(name: &str, flat: &str) -> Visitor {
        Visitor::from_new(NewVisitor {
            details: VisitorDetails {
                visitor_name: name.into(),
                visitor_phone: "555".into(),
                owner_name: "Owner".into(),
                flat_no: flat.into(),
                ..Default::default()
            },
            bike_number: "-".into(),
            bike_image_ref: None,
            visitor_image_ref: "v.jpg".into(),
            captured_by: "g".into(),
            security_email: "g@x.com".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        })
    }

    fn export(visitors: Vec<Visitor>) -> VisitorExport {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        VisitorExport {
            visitors,
            window: ReportWindow::days(first, last),
            exported_at: Utc::now(),
        }
    }

    #[test]
    fn csv_round_trips_awkward_fields() {
        let data = export(vec![
            visitor("Smith, \"Jr\"", "A-1"),
            visitor("Plain", "line\nbreak"),
        ]);
        let rows = parse_csv(&data.to_csv());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], CSV_HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][0], "Smith, \"Jr\"");
        assert_eq!(rows[1][4], "pending");
        assert_eq!(rows[1][6], "2024-01-01T10:00:00Z");
        assert_eq!(rows[2][3], "line\nbreak");
    }

    #[test]
    fn filename_names_first_and_last_day() {
        let data = export(vec![]);
        assert_eq!(
            data.filename(ExportFormat::Csv),
            "visitors-2024-01-01-to-2024-01-03.csv"
        );
    }

    #[test]
    fn format_defaults_to_csv() {
        assert_eq!(ExportFormat::parse(None), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse(Some("JSON")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse(Some("xml")), None);
    }
}
