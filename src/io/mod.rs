//! Text-format I/O for the match interchange format.
//!
//! One match per line: `"<cat_ind> <input_ind> <cosdist>\n"`, `cosdist`
//! rendered at 17 significant digits so re-parsing round-trips losslessly.
//! No header, no trailing blank line.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::util::error::{SmatchError, SmatchResult};

/// One parsed line of the match interchange format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchRecord {
    pub cat_ind: i64,
    pub input_ind: i64,
    pub cosdist: f64,
}

/// Writes a single match line to `w`.
pub(crate) fn write_match_line<W: Write>(
    w: &mut W,
    cat_ind: i64,
    input_ind: i64,
    cosdist: f64,
) -> SmatchResult<()> {
    writeln!(w, "{cat_ind} {input_ind} {cosdist:.16e}")
        .map_err(|e| SmatchError::io("write_match_line", e))
}

/// Counts the `\n` bytes in `path`, reading it in fixed-size chunks to EOF.
pub fn count_lines<P: AsRef<Path>>(path: P) -> SmatchResult<u64> {
    let file = File::open(path.as_ref()).map_err(|e| SmatchError::io("count_lines: open", e))?;
    let mut reader = BufReader::new(file);
    let mut buf = [0u8; 64 * 1024];
    let mut count = 0u64;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| SmatchError::io("count_lines: read", e))?;
        if n == 0 {
            break;
        }
        count += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
    }
    Ok(count)
}

/// Parses every line of `path` into `out`.
///
/// `out` is expected to already be sized to the number of matches the
/// caller wants back; on return its length always reflects the number of
/// lines actually read, and a mismatch against the caller's original
/// length is reported as [`SmatchError::SizeMismatch`] rather than silently
/// truncating or leaving stale entries.
pub fn load_matches<P: AsRef<Path>>(path: P, out: &mut Vec<MatchRecord>) -> SmatchResult<()> {
    let file = File::open(path.as_ref()).map_err(|e| SmatchError::io("load_matches: open", e))?;
    let reader = BufReader::new(file);
    let expected = out.len();
    out.clear();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SmatchError::io("load_matches: read", e))?;
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let cat_ind = fields
            .next()
            .ok_or_else(|| parse_err(line_no, "missing cat_ind field"))?
            .parse::<i64>()
            .map_err(|_| parse_err(line_no, "cat_ind is not an integer"))?;
        let input_ind = fields
            .next()
            .ok_or_else(|| parse_err(line_no, "missing input_ind field"))?
            .parse::<i64>()
            .map_err(|_| parse_err(line_no, "input_ind is not an integer"))?;
        let cosdist = fields
            .next()
            .ok_or_else(|| parse_err(line_no, "missing cosdist field"))?
            .parse::<f64>()
            .map_err(|_| parse_err(line_no, "cosdist is not a float"))?;
        out.push(MatchRecord {
            cat_ind,
            input_ind,
            cosdist,
        });
    }

    if out.len() != expected {
        return Err(SmatchError::SizeMismatch {
            context: "load_matches: output buffer",
            expected,
            got: out.len(),
        });
    }

    Ok(())
}

fn parse_err(line_no: usize, reason: &str) -> SmatchError {
    SmatchError::ParseError {
        line: line_no + 1,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("smatch-io-test-{name}-{}", std::process::id()));
        p
    }

    #[test]
    fn write_match_line_has_exactly_three_space_separated_fields() {
        let mut buf = Vec::new();
        write_match_line(&mut buf, 3, 9, 0.999_999_5).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("3 9 "));
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
        assert_eq!(text.matches(' ').count(), 2);
    }

    #[test]
    fn round_trip_through_in_memory_text() {
        let mut buf = Vec::new();
        write_match_line(&mut buf, 0, 1, 0.987_654_321).unwrap();
        write_match_line(&mut buf, 2, 3, 0.5).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut records = Vec::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let cat_ind: i64 = fields.next().unwrap().parse().unwrap();
            let input_ind: i64 = fields.next().unwrap().parse().unwrap();
            let cosdist: f64 = fields.next().unwrap().parse().unwrap();
            records.push((cat_ind, input_ind, cosdist));
        }
        assert_eq!(records[0], (0, 1, 0.987_654_321));
        assert_eq!(records[1], (2, 3, 0.5));
    }

    #[test]
    fn count_lines_matches_newline_count() {
        let path = temp_path("count");
        std::fs::write(&path, "a b c\nd e f\ng h i\n").unwrap();
        let n = count_lines(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(n, 3);
    }

    #[test]
    fn count_lines_on_missing_file_is_io_error() {
        let path = temp_path("missing-does-not-exist");
        let err = count_lines(&path).unwrap_err();
        assert!(matches!(err, SmatchError::IoError { .. }));
    }

    #[test]
    fn load_matches_parses_lines_and_matches_expected_length() {
        let path = temp_path("load-ok");
        std::fs::write(&path, "0 1 9.900000000000000e-1\n2 3 5.000000000000000e-1\n").unwrap();
        let mut out = vec![
            MatchRecord {
                cat_ind: 0,
                input_ind: 0,
                cosdist: 0.0,
            };
            2
        ];
        load_matches(&path, &mut out).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].cat_ind, 0);
        assert_eq!(out[0].input_ind, 1);
        assert!((out[0].cosdist - 0.99).abs() < 1e-12);
    }

    #[test]
    fn load_matches_rejects_short_line() {
        let path = temp_path("load-short");
        std::fs::write(&path, "0 1\n").unwrap();
        let mut out = vec![
            MatchRecord {
                cat_ind: 0,
                input_ind: 0,
                cosdist: 0.0,
            };
            1
        ];
        let err = load_matches(&path, &mut out).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, SmatchError::ParseError { .. }));
    }

    #[test]
    fn load_matches_rejects_length_mismatch() {
        let path = temp_path("load-mismatch");
        std::fs::write(&path, "0 1 1.0e0\n").unwrap();
        let mut out = vec![
            MatchRecord {
                cat_ind: 0,
                input_ind: 0,
                cosdist: 0.0,
            };
            2
        ];
        let err = load_matches(&path, &mut out).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, SmatchError::SizeMismatch { .. }));
    }
}
