//! Parser for the tab-separated data (`.tsd`) format.
//!
//! Each line is `<name>\t<label>\t<x>,<y>`: the name starts with `@`, the
//! label is free text (`null` marks an unlabeled instance) and the location
//! is two numbers separated by one comma with no whitespace.

use crate::dataset::{Dataset, Point};
use crate::error::{ParseReport, Violation, ViolationKind};

/// One syntactically valid record
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub location: Point,
}

/// Parse a single line, without duplicate detection
pub fn parse_line(line: &str) -> Result<Record<'_>, ViolationKind> {
    if line.is_empty() {
        return Err(ViolationKind::EmptyLine);
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 3 {
        return Err(ViolationKind::MalformedRecord(fields.len()));
    }

    let name = fields[0];
    if !name.starts_with('@') {
        return Err(ViolationKind::InvalidName(name.to_string()));
    }

    let location = parse_location(fields[2])
        .ok_or_else(|| ViolationKind::MalformedNumber(fields[2].to_string()))?;

    Ok(Record {
        name,
        label: fields[1],
        location,
    })
}

fn parse_location(text: &str) -> Option<Point> {
    let (x, y) = text.split_once(',')?;
    Some(Point::new(parse_coordinate(x)?, parse_coordinate(y)?))
}

fn parse_coordinate(text: &str) -> Option<f64> {
    // `f64::from_str` already rejects whitespace; also refuse inf/NaN spellings
    let value: f64 = text.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse `.tsd` text into a [`Dataset`].
///
/// Every invalid line contributes one [`Violation`]; if there is at least one,
/// the whole parse fails with a [`ParseReport`] listing all of them in order.
/// A duplicate name keeps the first occurrence. A violation's line number is
/// one past the count of instances accepted before it, so every rejected
/// line after the same accepted prefix shares a number.
pub fn parse(text: &str) -> Result<Dataset, ParseReport> {
    let mut dataset = Dataset::new();
    let mut violations = Vec::new();

    for line in text.lines() {
        // Numbered by position among accepted instances
        let line_number = dataset.len() + 1;
        let outcome = parse_line(line).and_then(|record| {
            if dataset.insert(record.name, record.label, record.location) {
                Ok(())
            } else {
                Err(ViolationKind::DuplicateName(record.name.to_string()))
            }
        });

        if let Err(kind) = outcome {
            log::debug!("Rejected line {}: {}", line_number, kind);
            violations.push(Violation {
                line: line_number,
                kind,
            });
        }
    }

    if violations.is_empty() {
        Ok(dataset)
    } else {
        Err(ParseReport { violations })
    }
}

/// Check `.tsd` text without keeping the resulting dataset
pub fn validate(text: &str) -> Result<(), ParseReport> {
    parse(text).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_standard() {
        let record = parse_line("@a\tlabel1\t1,1").unwrap();
        assert_eq!(record.name, "@a");
        assert_eq!(record.label, "label1");
        assert_eq!(record.location, Point::new(1.0, 1.0));
    }

    #[test]
    fn test_parse_line_null_label_and_decimals() {
        let record = parse_line("@d\tnull\t3.12,4.15").unwrap();
        assert_eq!(record.label, "null");
        assert_eq!(record.location, Point::new(3.12, 4.15));
    }

    #[test]
    fn test_parse_line_invalid_name() {
        assert_eq!(
            parse_line("name\tlabel1\t1,1"),
            Err(ViolationKind::InvalidName("name".to_string()))
        );
    }

    #[test]
    fn test_parse_line_non_numeric_location() {
        assert_eq!(
            parse_line("@c\tlabel1\tx,y"),
            Err(ViolationKind::MalformedNumber("x,y".to_string()))
        );
    }

    #[test]
    fn test_parse_line_rejects_whitespace_in_numbers() {
        assert!(matches!(
            parse_line("@c\tl\t1, 2"),
            Err(ViolationKind::MalformedNumber(_))
        ));
        assert!(matches!(
            parse_line("@c\tl\t 1,2"),
            Err(ViolationKind::MalformedNumber(_))
        ));
    }

    #[test]
    fn test_parse_line_rejects_extra_comma_and_non_finite() {
        assert!(matches!(
            parse_line("@c\tl\t1,2,3"),
            Err(ViolationKind::MalformedNumber(_))
        ));
        assert!(matches!(
            parse_line("@c\tl\tNaN,2"),
            Err(ViolationKind::MalformedNumber(_))
        ));
        assert!(matches!(
            parse_line("@c\tl\t1,inf"),
            Err(ViolationKind::MalformedNumber(_))
        ));
    }

    #[test]
    fn test_parse_line_field_count() {
        assert_eq!(
            parse_line("@a\t1,1"),
            Err(ViolationKind::MalformedRecord(2))
        );
        assert_eq!(
            parse_line("@a\tl\t1,1\textra"),
            Err(ViolationKind::MalformedRecord(4))
        );
    }

    #[test]
    fn test_parse_line_empty() {
        assert_eq!(parse_line(""), Err(ViolationKind::EmptyLine));
    }

    #[test]
    fn test_trailing_newline_is_not_an_empty_line() {
        let dataset = parse("@a\tL\t1,1\n").unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_interior_empty_line_is_rejected() {
        let report = parse("\n@a\tL\t1,1\n\n@b\tL\t2,2\n").unwrap_err();
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[0].line, 1);
        assert_eq!(report.violations[1].line, 2);
        assert_eq!(report.violations[0].kind, ViolationKind::EmptyLine);
    }

    #[test]
    fn test_collects_every_violation() {
        let text = "@a\tlabel1\t1,1\n\
                    name\tlabel1\t1,1\n\
                    @a\tlabel1\t2,2\n\
                    @c\tlabel1\tx,y\n\
                    @d\tlabel1\t3.12,4.15\n";
        let report = parse(text).unwrap_err();

        let kinds: Vec<&ViolationKind> = report.violations.iter().map(|v| &v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &ViolationKind::InvalidName("name".to_string()),
                &ViolationKind::DuplicateName("@a".to_string()),
                &ViolationKind::MalformedNumber("x,y".to_string()),
            ]
        );
        let lines: Vec<usize> = report.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![2, 2, 2]);
    }

    #[test]
    fn test_line_numbers_follow_accepted_instances() {
        let report = parse("@a\tL\t1,1\nb\tL\t2,2\nc\tL\t3,3\n@d\tL\t4,4\n\n").unwrap_err();
        let lines: Vec<usize> = report.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![2, 2, 3]);
    }

    #[test]
    fn test_validate() {
        assert!(validate("@a\tL\t1,1\n@b\tL\t2,2").is_ok());
        assert!(validate("a\tL\t1,1").is_err());
    }

    #[test]
    fn test_empty_input_is_empty_dataset() {
        let dataset = parse("").unwrap();
        assert!(dataset.is_empty());
    }
}
