use std::borrow::Cow;

use crate::models::ScanRecord;

pub const HEADER: [&str; 5] = ["Timestamp", "Barcode", "Quantity", "UnitOfMeasure", "Location"];

const LINE_ENDING: &str = "\r\n";

/// Quotes a field when it contains a delimiter, a quote or a line break;
/// inner quotes are doubled. Anything else passes through untouched.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// `3.0` prints as `3`, `2.5` as `2.5`.
pub fn format_quantity(quantity: f64) -> String {
    format!("{quantity}")
}

fn render_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn render(records: &[ScanRecord]) -> String {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(render_row(HEADER));

    for record in records {
        let timestamp = record.timestamp_iso();
        let quantity = format_quantity(record.quantity());
        rows.push(render_row([
            timestamp.as_str(),
            record.barcode(),
            quantity.as_str(),
            record.uom(),
            record.location(),
        ]));
    }

    rows.join(LINE_ENDING)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Minimal reader for the dialect `render` writes, used to check that
    /// escaped fields come back byte-for-byte.
    pub(crate) fn parse(text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    other => field.push(other),
                }
                continue;
            }

            match c {
                '"' => in_quotes = true,
                ',' => row.push(std::mem::take(&mut field)),
                '\r' if chars.peek() == Some(&'\n') => {
                    chars.next();
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                other => field.push(other),
            }
        }

        row.push(field);
        rows.push(row);
        rows
    }

    fn record(barcode: &str, quantity: f64, uom: &str, location: &str) -> ScanRecord {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap();
        ScanRecord::new(timestamp, barcode, quantity, uom, location).unwrap()
    }

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(escape_field("012345678905"), "012345678905");
        assert!(matches!(escape_field("A1"), Cow::Borrowed(_)));
    }

    #[test]
    fn special_characters_force_quotes() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("6\" pipe"), "\"6\"\" pipe\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape_field("carriage\rreturn"), "\"carriage\rreturn\"");
    }

    #[test]
    fn integral_quantities_print_without_fraction() {
        assert_eq!(format_quantity(3.0), "3");
        assert_eq!(format_quantity(0.0), "0");
        assert_eq!(format_quantity(2.25), "2.25");
    }

    #[test]
    fn renders_header_and_crlf_rows() {
        let csv = render(&[record("012345678905", 3.0, "ea", "A1")]);
        assert_eq!(
            csv,
            "Timestamp,Barcode,Quantity,UnitOfMeasure,Location\r\n\
             2024-05-01T09:30:12.000Z,012345678905,3,ea,A1"
        );
    }

    #[test]
    fn awkward_fields_survive_escaping() {
        let location = "Aisle 3, \"top\" shelf\nback row";
        let uom = "box, 12\"";
        let csv = render(&[record("X-1", 1.5, uom, location)]);

        let rows = parse(&csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], HEADER.map(String::from).to_vec());
        assert_eq!(rows[1][1], "X-1");
        assert_eq!(rows[1][2], "1.5");
        assert_eq!(rows[1][3], uom);
        assert_eq!(rows[1][4], location);
    }
}
