//! Incremental stream handling: the session processes each completed line
//! exactly once, defers partial lines, and isolates failures per expression.

use despew::session::{Note, Session, SessionConfig};

fn config(fill_width: usize) -> SessionConfig {
    SessionConfig {
        fill_width,
        indent_unit: 2,
        ..Default::default()
    }
}

// Clang-style plain quotes keep the fixture ASCII so it can be split at any
// byte offset.
const STREAM: &str = concat!(
    "In file included from widget.cc:2:\n",
    "widget.cc:14:9: error: no matching function for call to 'std::vector<int, std::allocator<int>>'\n",
    "widget.cc:20:1: note: candidate 'void emit(int, double) [with T = int; U = double]' not viable\n",
    "3 warnings generated.\n",
);

#[test]
fn chunked_feeding_matches_one_shot_processing() {
    let mut whole = Session::new(config(24));
    let whole_reports = whole.process(STREAM);

    let mut chunked = Session::new(config(24));
    let mut chunked_reports = Vec::new();
    for cut in [10, 50, 90, 140, STREAM.len()] {
        chunked_reports.extend(chunked.process(&STREAM[..cut]));
    }

    assert_eq!(whole_reports.len(), chunked_reports.len());
    assert_eq!(whole.records().len(), chunked.records().len());
    for (a, b) in whole.records().iter().zip(chunked.records()) {
        assert_eq!(a.span, b.span);
        assert_eq!(a.instructions, b.instructions);
        assert_eq!(a.regions, b.regions);
    }
}

#[test]
fn lines_are_never_reprocessed() {
    let mut session = Session::new(config(24));
    let first = session.process(STREAM);
    assert!(!first.is_empty());
    let again = session.process(STREAM);
    assert!(again.is_empty());
    assert_eq!(session.consumed(), STREAM.len());
}

#[test]
fn reset_starts_a_new_compiler_run() {
    let mut session = Session::new(config(24));
    session.process(STREAM);
    assert!(!session.records().is_empty());
    session.reset();
    assert_eq!(session.consumed(), 0);
    assert!(session.records().is_empty());
    assert!(!session.process(STREAM).is_empty());
}

#[test]
fn partial_match_still_formats_the_prefix() {
    let mut session = Session::new(config(20));
    let line = "widget.cc:9:5: error: no match for 'std::vector<int, std::allocator<int>> %% trailing'\n";
    let reports = session.process(line);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].expressions.len(), 1);
    assert!(matches!(reports[0].notes[0], Note::Partial { .. }));
    let record = &session.records()[0];
    assert!(record.span.end < record.quoted.end);
    assert!(!record.instructions.is_empty());
}

#[test]
fn fold_then_unfold_restores_visibility() {
    let mut session = Session::new(config(20));
    session.process(STREAM);
    let pos = session.records()[0].span.start;

    let folded: Vec<_> = session.fold_at(pos, Some(2)).unwrap().to_vec();
    assert!(folded.iter().any(|f| f.hidden && f.placeholder));
    let refolded: Vec<_> = session.fold_at(pos, Some(2)).unwrap().to_vec();
    assert_eq!(folded, refolded);

    let unfolded = session.fold_at(pos, None).unwrap();
    assert!(unfolded.iter().all(|f| !f.hidden && !f.placeholder));
}

#[test]
fn records_serialize_to_json() {
    let mut session = Session::new(config(24));
    session.process(STREAM);
    let json = serde_json::to_string(session.records()).unwrap();
    assert!(json.contains("instructions"));
    assert!(json.contains("regions"));
}
