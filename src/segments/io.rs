//! CSV I/O for segment records.
//!
//! One record per line, `x1,y1,x2,y2`, order-significant: the line number
//! defines the segment index. Malformed records fail loudly with
//! [`Error::MalformedRecord`] naming the 1-based line.

use std::fs;
use std::path::Path;

use super::Segment;
use crate::error::Error;

/// Reads a segment collection from a comma-separated file.
///
/// Blank lines are ignored; an empty file yields an empty collection.
pub fn read_segments_csv(path: &Path) -> Result<Vec<Segment>, Error> {
    let data = fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_segments(&data)
}

/// Parses segment records from in-memory text; see [`read_segments_csv`].
pub fn parse_segments(data: &str) -> Result<Vec<Segment>, Error> {
    let mut segments = Vec::new();
    for (idx, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let coords = parse_floats(line, idx + 1, 4)?;
        segments.push(Segment::from_coords(
            coords[0], coords[1], coords[2], coords[3],
        ));
    }
    Ok(segments)
}

/// Writes the collection in the same 4-tuple textual form, one per line.
pub fn write_segments_csv(path: &Path, segments: &[Segment]) -> Result<(), Error> {
    let mut out = String::new();
    for seg in segments {
        out.push_str(&format!(
            "{},{},{},{}\n",
            seg.source.x, seg.source.y, seg.target.x, seg.target.y
        ));
    }
    fs::write(path, out).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Splits `line` on commas and parses exactly `count` floats.
pub(crate) fn parse_floats(line: &str, line_no: usize, count: usize) -> Result<Vec<f64>, Error> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != count {
        return Err(Error::MalformedRecord {
            line: line_no,
            message: format!("expected {count} fields, found {}", fields.len()),
        });
    }
    fields
        .iter()
        .map(|f| {
            f.parse::<f64>().map_err(|_| Error::MalformedRecord {
                line: line_no,
                message: format!("invalid number {f:?}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_order() {
        let segs = parse_segments("0,0,10,0.2\n10,0.2,10.1,10\n").unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].source.x, 0.0);
        assert_eq!(segs[1].target.y, 10.0);
    }

    #[test]
    fn skips_blank_lines() {
        let segs = parse_segments("\n1,2,3,4\n\n").unwrap();
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn empty_input_is_empty_collection() {
        assert!(parse_segments("").unwrap().is_empty());
    }

    #[test]
    fn malformed_record_names_the_line() {
        let err = parse_segments("1,2,3,4\n1,2,nope,4\n").unwrap_err();
        match err {
            Error::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = parse_segments("1,2,3\n").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 1, .. }));
    }
}
