use chrono::NaiveDate;

use crate::errors::AppError;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parses one labeled block of free-text event dates, one per line. Blank
/// lines are skipped. A single unparseable line fails the whole group with
/// a `DateParse` error carrying the group label, so the caller can report
/// it without aborting other groups.
pub fn parse_group(label: &str, text: &str) -> Result<Vec<NaiveDate>, AppError> {
    let mut dates = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(line, fmt).ok());

        match parsed {
            Some(date) => dates.push(date),
            None => {
                return Err(AppError::DateParse {
                    group: label.to_string(),
                    detail: format!("could not parse {:?} - check format (YYYY-MM-DD)", line),
                })
            }
        }
    }

    Ok(dates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_one_date_per_line() {
        let dates = parse_group("2024", "2024-02-21\n2024-05-22\n2024-08-28").unwrap();
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 21).unwrap());
    }

    #[test]
    fn test_blank_lines_and_whitespace_are_skipped() {
        let dates = parse_group("2024", "\n  2024-02-21  \n\n2024-05-22\n").unwrap();
        assert_eq!(dates.len(), 2);
    }

    #[test]
    fn test_slash_format_is_accepted() {
        let dates = parse_group("2024", "2024/02/21").unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 2, 21).unwrap());
    }

    #[test]
    fn test_malformed_line_fails_with_group_label() {
        let err = parse_group("2023", "2023-02-22\nnot-a-date").unwrap_err();
        match err {
            AppError::DateParse { group, detail } => {
                assert_eq!(group, "2023");
                assert!(detail.contains("not-a-date"));
            }
            other => panic!("expected DateParse, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_text_is_an_empty_group() {
        let dates = parse_group("2024", "").unwrap();
        assert!(dates.is_empty());
    }
}
