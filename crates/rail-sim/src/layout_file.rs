//! Plain-text layout reader.

use std::path::Path;

use anyhow::{Context, Result, bail};
use rail_kernel::LayoutRecord;
use tracing::{debug, warn};

/// Read and parse a layout file.
pub fn read_layout(path: impl AsRef<Path>) -> Result<Vec<LayoutRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout {}", path.display()))?;
    let records =
        parse_layout(&text).with_context(|| format!("Invalid layout {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "Layout read");
    Ok(records)
}

/// Parse layout text into records, keeping file order.
///
/// Blank lines and `#` comments are skipped. Unknown record kinds are
/// skipped with a warning; malformed known records are errors.
pub fn parse_layout(text: &str) -> Result<Vec<LayoutRecord>> {
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let line_no = index + 1;
        if let Some(record) =
            parse_record(line).with_context(|| format!("line {line_no}: `{line}`"))?
        {
            records.push(record);
        }
    }

    Ok(records)
}

fn parse_record(line: &str) -> Result<Option<LayoutRecord>> {
    let mut words = line.split_whitespace();
    let Some(kind) = words.next() else {
        return Ok(None);
    };
    let values: Vec<&str> = words.collect();

    let record = match kind {
        "station" => {
            let [x, y] = coordinates(&values)?;
            LayoutRecord::station(x, y)
        }
        "switch" => {
            let [x, y] = coordinates(&values)?;
            LayoutRecord::switch(x, y)
        }
        "track" => match values.len() {
            4 => {
                let [x1, y1, x2, y2] = coordinates(&values)?;
                LayoutRecord::track(x1, y1, x2, y2)
            }
            5 => {
                let [x1, y1, x2, y2] = coordinates(&values[..4])?;
                let segments: u32 = values[4]
                    .parse()
                    .with_context(|| format!("`{}` is not a segment count", values[4]))?;
                LayoutRecord::subdivided_track(x1, y1, x2, y2, segments)
            }
            n => bail!("track expects 4 coordinates and an optional segment count, got {n} values"),
        },
        other => {
            warn!(kind = other, "Unknown layout record, skipping");
            return Ok(None);
        }
    };

    Ok(Some(record))
}

fn coordinates<const N: usize>(values: &[&str]) -> Result<[f64; N]> {
    if values.len() != N {
        bail!("expected {N} coordinates, got {}", values.len());
    }

    let mut parsed = [0.0; N];
    for (slot, value) in parsed.iter_mut().zip(values) {
        *slot = value
            .parse()
            .with_context(|| format!("`{value}` is not a number"))?;
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_kernel::Location;

    #[test]
    fn test_parses_all_record_kinds() {
        let text = "\
# two stations and a junction
station 0 0
track 0 0 2 0
switch 2 0
track 2 0 6 0 2   # split in two

station 6 0
";
        let records = parse_layout(text).unwrap();
        assert_eq!(
            records,
            vec![
                LayoutRecord::station(0.0, 0.0),
                LayoutRecord::track(0.0, 0.0, 2.0, 0.0),
                LayoutRecord::switch(2.0, 0.0),
                LayoutRecord::subdivided_track(2.0, 0.0, 6.0, 0.0, 2),
                LayoutRecord::station(6.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_fractional_and_negative_coordinates() {
        let records = parse_layout("station -1.5 2.25").unwrap();
        assert_eq!(
            records,
            vec![LayoutRecord::Station {
                location: Location::new(-1.5, 2.25)
            }]
        );
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let records = parse_layout("signal 1 1\nstation 0 0").unwrap();
        assert_eq!(records, vec![LayoutRecord::station(0.0, 0.0)]);
    }

    #[test]
    fn test_errors_carry_line_number() {
        let err = parse_layout("station 0 0\n\ntrack 0 0 x 1").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 3"), "got: {message}");
        assert!(message.contains("`x` is not a number"), "got: {message}");
    }

    #[test]
    fn test_wrong_arity_rejected() {
        assert!(parse_layout("station 0").is_err());
        assert!(parse_layout("switch 0 0 0").is_err());
        assert!(parse_layout("track 0 0 1").is_err());
        assert!(parse_layout("track 0 0 1 1 2 3").is_err());
        assert!(parse_layout("track 0 0 1 1 -2").is_err());
    }

    #[test]
    fn test_empty_text_gives_no_records() {
        assert!(parse_layout("\n  \n# nothing\n").unwrap().is_empty());
    }
}
