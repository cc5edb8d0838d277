//! Round-trips the match interchange format written by `match2file` back
//! through `count_lines` and `load_matches`.

use smatch::{MatchOptions, MatchRecord, Matcher};

#[test]
fn unbounded_stream_round_trips_through_count_lines_and_load_matches() {
    let mut m = Matcher::new(64, &[30.0, 200.0], &[5.0, -10.0], &[0.4, 0.6]).unwrap();
    let ra = [30.0, 30.05, 200.0, 200.1, 90.0];
    let dec = [5.0, 5.02, -10.0, -10.3, 0.0];

    let mut path = std::env::temp_dir();
    path.push(format!("smatch-io-round-trip-{}", std::process::id()));

    m.match2file(&MatchOptions::unbounded(), &ra, &dec, &path).unwrap();

    let lines = smatch::count_lines(&path).unwrap();
    assert_eq!(lines, m.nmatches());

    let mut out = vec![
        MatchRecord {
            cat_ind: 0,
            input_ind: 0,
            cosdist: 0.0,
        };
        lines as usize
    ];
    smatch::load_matches(&path, &mut out).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(out.len() as u64, lines);
    for rec in &out {
        assert!(rec.cat_ind == 0 || rec.cat_ind == 1);
        assert!(rec.cosdist > -1.0 && rec.cosdist <= 1.0);
    }
}

#[test]
fn load_matches_rejects_a_buffer_sized_for_the_wrong_line_count() {
    let mut m = Matcher::new(32, &[10.0], &[0.0], &[0.5]).unwrap();
    let ra = [10.0];
    let dec = [0.0];

    let mut path = std::env::temp_dir();
    path.push(format!("smatch-io-mismatch-{}", std::process::id()));
    m.match2file(&MatchOptions::unbounded(), &ra, &dec, &path).unwrap();

    let mut out = vec![
        MatchRecord {
            cat_ind: 0,
            input_ind: 0,
            cosdist: 0.0,
        };
        0
    ];
    let err = smatch::load_matches(&path, &mut out).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, smatch::SmatchError::SizeMismatch { .. }));
}

#[test]
fn count_lines_on_missing_file_is_io_error() {
    let mut path = std::env::temp_dir();
    path.push(format!("smatch-io-missing-{}-does-not-exist", std::process::id()));
    let err = smatch::count_lines(&path).unwrap_err();
    assert!(matches!(err, smatch::SmatchError::IoError { .. }));
}
