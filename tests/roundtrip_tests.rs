mod common;

use chrono::Utc;
use common::SessionBuilder;
use regex::Regex;
use rstest::rstest;
use scorekeep::app::AppController;
use scorekeep::session::round::{MahjongOutcome, RoundEntry, ScoringMode};
use scorekeep::session::Session;
use scorekeep::tabular::{export_session, export_sessions, import};

fn workbook() -> Vec<Session> {
    vec![
        SessionBuilder::new("s1", &["Ann", "Bo", "Cy"])
            .name("Friday, late")
            .round(&[4, -2, -2])
            .round(&[-1, 3, -2])
            .build(),
        SessionBuilder::new("s2", &["Ann", "Bo", "Cy", "Di"])
            .name("Saturday")
            .mahjong()
            .entry(RoundEntry::Settled(MahjongOutcome::with_winner(1).concealed(3)))
            .round(&[0, 0, 0, 0])
            .build(),
    ]
}

#[test]
fn workbook_round_trips_scores_and_rosters() {
    let sessions = workbook();
    let text = export_sessions(&sessions, Utc::now()).unwrap();
    let imported = import(&text).unwrap();

    assert_eq!(imported.len(), sessions.len());
    for (orig, back) in sessions.iter().zip(&imported) {
        assert_eq!(back.id, orig.id);
        assert_eq!(back.name, orig.name);
        assert_eq!(back.players, orig.players);
        assert_eq!(back.scoring_mode, orig.scoring_mode);
        let orig_scores: Vec<&Vec<i64>> = orig.rounds.iter().map(|r| &r.scores).collect();
        let back_scores: Vec<&Vec<i64>> = back.rounds.iter().map(|r| &r.scores).collect();
        assert_eq!(back_scores, orig_scores);
        assert_eq!(back.next_round_id, back.rounds.len() as u64 + 1);
    }
}

fn scores_of(session: &Session) -> Vec<Vec<i64>> {
    session.rounds.iter().map(|r| r.scores.clone()).collect()
}

#[rstest]
#[case::blank_middle_name(&["A", "", "C"])]
#[case::all_blank(&["", ""])]
#[case::padded_names(&[" Ann", "Bo ", "  "])]
#[case::comma_and_quote(&["Smith, J", "\"Ace\"", "O'Neil"])]
#[case::line_break(&["Two\nLines", "B", "C\r\nD"])]
#[case::header_words(&["Timestamp", "Total", "Round", "Players"])]
fn unusual_rosters_round_trip(#[case] players: &[&str]) {
    let n = players.len() as i64;
    let mut first = vec![-1; players.len()];
    first[0] = n - 1;
    let mut second: Vec<i64> = (1..=n).collect();
    second[players.len() - 1] = -(n - 1) * n / 2;
    let session = SessionBuilder::new("odd", players)
        .round(&first)
        .round(&second)
        .build();

    let workbook = import(&export_sessions(std::slice::from_ref(&session), Utc::now()).unwrap())
        .unwrap();
    assert_eq!(workbook.len(), 1);
    assert_eq!(workbook[0].players, session.players);
    assert_eq!(scores_of(&workbook[0]), scores_of(&session));

    let sheet = import(&export_session(&session, Utc::now()).unwrap()).unwrap();
    assert_eq!(sheet[0].players, session.players);
    assert_eq!(scores_of(&sheet[0]), scores_of(&session));
}

#[test]
fn blank_name_keeps_later_columns_in_place() {
    let session = SessionBuilder::new("gap", &["A", "", "C"])
        .round(&[1, 2, -3])
        .build();
    let text = export_sessions(&[session], Utc::now()).unwrap();
    let back = import(&text).unwrap();
    assert_eq!(back[0].players, vec!["A", "", "C"]);
    assert_eq!(back[0].rounds[0].scores, vec![1, 2, -3]);
}

#[test]
fn exported_rows_carry_prefix_sums() {
    let session = SessionBuilder::new("s", &["A", "B"])
        .round(&[5, -5])
        .round(&[-2, 2])
        .round(&[1, -1])
        .build();
    let text = export_session(&session, Utc::now()).unwrap();
    let row_re = Regex::new(
        r#"^"(\d+)","\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}","(-?\d+)","(-?\d+)","(-?\d+)","(-?\d+)"$"#,
    )
    .unwrap();

    let mut running = [0i64; 2];
    let mut seen = 0;
    for line in text.trim_start_matches('\u{feff}').split("\r\n") {
        let Some(caps) = row_re.captures(line) else {
            continue;
        };
        let score = |i: usize| caps[i].parse::<i64>().unwrap();
        running[0] += score(2);
        running[1] += score(3);
        assert_eq!([score(4), score(5)], running, "line {}", line);
        seen += 1;
    }
    assert_eq!(seen, 3);
}

#[test]
fn workbook_header_lines() {
    let text = export_sessions(&workbook(), Utc::now()).unwrap();
    let lines: Vec<&str> = text.trim_start_matches('\u{feff}').split("\r\n").collect();
    assert!(lines[0].starts_with("\"Generated At\","));
    assert_eq!(lines[1], "\"Version\",\"2\"");
    assert!(lines[2].starts_with("\"Session\",\"s1\",\"Friday, late\",\"CreatedAt\","));
    assert!(lines[2].ends_with(",\"Mode\",\"standard\""));
    assert_eq!(lines[3], "\"Players\",\"Ann\",\"Bo\",\"Cy\"");
}

#[test]
fn mahjong_total_row_reports_sets() {
    let text = export_session(&workbook()[1], Utc::now()).unwrap();
    assert!(text.contains("\"C0/E0\",\"C0/E0\",\"C0/E0\",\"C1/E0\""));
}

#[test]
fn controller_import_is_all_or_nothing() {
    let mut app = AppController::in_memory();
    let before = app.state().clone();
    let broken = "\u{feff}\"Version\",\"2\"\r\n\"Session\",\"a\",\"A\"\r\n\"Players\",\"X\",\"Y\"\r\n\"Round\",\"Timestamp\",\"X\",\"Y\"\r\n\"1\",\"\",\"1\",\"-1\"\r\n\"Total\"\r\n\"Session\",\"b\",\"B\"\r\n\"Players\",\"X\"\r\n";
    assert!(app.import_csv(broken).is_err());
    assert_eq!(app.state(), &before);
}

#[test]
fn controller_import_renames_colliding_ids_and_switches() {
    let mut app = AppController::in_memory();
    let existing = app.state().current_session_id.clone();
    let mut session = workbook().remove(0);
    session.id = existing.clone();
    let text = export_sessions(&[session], Utc::now()).unwrap();

    let ids = app.import_csv(&text).unwrap();
    assert_eq!(ids.len(), 1);
    assert_ne!(ids[0], existing);
    assert_eq!(app.state().current_session_id, ids[0]);
    assert_eq!(app.state().sessions.len(), 2);
    assert_eq!(app.current().unwrap().rounds.len(), 2);
    assert_eq!(app.current().unwrap().scoring_mode, ScoringMode::Standard);
}
