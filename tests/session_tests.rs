mod common;

use common::SessionBuilder;
use rstest::rstest;
use scorekeep::config::RuleConfig;
use scorekeep::error::ScoreKeepError;
use scorekeep::session::round::{MahjongOutcome, RoundEntry, ScoringMode};
use scorekeep::session::{manual_entry, stats, Session};

#[test]
fn round_ids_are_never_reused() {
    let mut s = SessionBuilder::new("s", &["A", "B"])
        .round(&[1, -1])
        .round(&[2, -2])
        .round(&[3, -3])
        .build();
    s.delete_round(3).unwrap();
    let id = s
        .append_round(RoundEntry::Scores(vec![4, -4]), &RuleConfig::default())
        .unwrap();
    assert_eq!(id, 4);
    let ids: Vec<u64> = s.rounds.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 4]);
}

#[rstest]
#[case(vec![5], vec![5, 0, 0])]
#[case(vec![1, 2, 3, 4], vec![1, 2, 3])]
#[case(vec![], vec![0, 0, 0])]
fn scores_fit_the_roster(#[case] entered: Vec<i64>, #[case] stored: Vec<i64>) {
    let mut s = SessionBuilder::new("s", &["A", "B", "C"]).build();
    let id = s
        .append_round(RoundEntry::Scores(entered), &RuleConfig::default())
        .unwrap();
    assert_eq!(s.round(id).unwrap().scores, stored);
}

#[test]
fn unbalanced_rounds_are_kept_and_reported() {
    let s = SessionBuilder::new("s", &["A", "B"])
        .round(&[1, -1])
        .round(&[5, 0])
        .build();
    assert_eq!(s.rounds.len(), 2);
    assert_eq!(s.unbalanced_round_ids(), vec![2]);
}

#[test]
fn adding_a_player_appends_zero_column() {
    let mut s = SessionBuilder::new("s", &["A", "B"])
        .round(&[2, -2])
        .build();
    assert_eq!(s.add_player().unwrap(), 2);
    assert_eq!(s.players[2], "Player 3");
    assert_eq!(s.rounds[0].scores, vec![2, -2, 0]);
}

#[test]
fn roster_limits_are_enforced() {
    let mut s = Session::with_default_players("s", "full", 8, ScoringMode::Standard).unwrap();
    assert!(matches!(s.add_player(), Err(ScoreKeepError::Rejected(_))));

    let mut pair = SessionBuilder::new("p", &["A", "B"]).build();
    assert!(matches!(pair.remove_player(0), Err(ScoreKeepError::Rejected(_))));

    assert!(matches!(
        Session::with_default_players("x", "too small", 1, ScoringMode::Standard),
        Err(ScoreKeepError::Validation(_))
    ));
}

#[test]
fn removing_a_player_drops_column_and_remaps_outcome() {
    let mut s = SessionBuilder::new("s", &["A", "B", "C", "D"])
        .mahjong()
        .entry(RoundEntry::Settled(
            MahjongOutcome::with_winner(3).concealed(2).exposed(3, 1),
        ))
        .build();
    let before = s.rounds[0].scores.clone();

    assert_eq!(s.remove_player(1).unwrap(), "B");
    let round = &s.rounds[0];
    assert_eq!(round.scores, vec![before[0], before[2], before[3]]);

    let outcome = round.outcome().unwrap();
    assert_eq!(outcome.winner, Some(2));
    assert_eq!(outcome.concealed_count(1), 1);
    // The exposed set pointed at the removed player and is gone.
    assert_eq!(outcome.exposed_count(2), 0);
}

#[test]
fn standard_session_rejects_settled_rounds() {
    let mut s = SessionBuilder::new("s", &["A", "B", "C", "D"]).build();
    let err = s
        .append_round(
            RoundEntry::Settled(MahjongOutcome::with_winner(0)),
            &RuleConfig::default(),
        )
        .unwrap_err();
    assert!(matches!(err, ScoreKeepError::Rejected(_)));
    assert!(s.rounds.is_empty());
}

#[test]
fn manual_override_keeps_given_scores() {
    let s = SessionBuilder::new("s", &["A", "B", "C", "D"])
        .mahjong()
        .entry(manual_entry(vec![10, -10, 0, 0], "chicken hand"))
        .build();
    let round = &s.rounds[0];
    assert_eq!(round.scores, vec![10, -10, 0, 0]);
    let outcome = round.outcome().unwrap();
    assert!(outcome.is_special);
    assert_eq!(outcome.special_note, "chicken hand");
}

#[test]
fn edit_recomputes_in_place() {
    let mut s = SessionBuilder::new("s", &["A", "B", "C", "D"])
        .mahjong()
        .entry(RoundEntry::Settled(MahjongOutcome::with_winner(0)))
        .entry(RoundEntry::Settled(MahjongOutcome::with_winner(1)))
        .build();
    s.replace_round(
        1,
        RoundEntry::Settled(MahjongOutcome::with_winner(2)),
        &RuleConfig::default(),
    )
    .unwrap();
    assert_eq!(s.rounds[0].id, 1);
    assert_eq!(s.rounds[0].scores, vec![-1, -1, 3, -1]);
    assert_eq!(s.next_round_id, 3);
}

#[test]
fn session_rules_override_global_rules() {
    let mut s = SessionBuilder::new("s", &["A", "B", "C", "D"])
        .mahjong()
        .build();
    let global = RuleConfig::default();
    s.set_rule_override(Some(RuleConfig {
        win_points_per_loser: 10,
        ..global
    }));
    let rules = s.effective_rules(&global);
    s.append_round(RoundEntry::Settled(MahjongOutcome::with_winner(0)), &rules)
        .unwrap();
    assert_eq!(s.rounds[0].scores, vec![30, -10, -10, -10]);
}

#[test]
fn duplicate_copies_previous_round() {
    let mut s = SessionBuilder::new("s", &["A", "B"])
        .round(&[4, -4])
        .round(&[1, -1])
        .build();
    s.duplicate_previous_round(2).unwrap();
    assert_eq!(s.rounds[1].scores, vec![4, -4]);
    assert_eq!(s.rounds[1].id, 2);

    s.duplicate_previous_round(1).unwrap();
    assert_eq!(s.rounds[0].scores, vec![4, -4]);
}

#[test]
fn cumulative_rows_are_prefix_sums() {
    let rows = vec![vec![3, -3, 0], vec![-1, 2, -1], vec![0, 0, 0], vec![5, -2, -3]];
    let mut builder = SessionBuilder::new("s", &["A", "B", "C"]);
    for r in &rows {
        builder = builder.round(r);
    }
    let s = builder.build();
    let cumulative = stats::cumulative_totals(&s);
    assert_eq!(cumulative, common::prefix_sums(&rows));
    assert_eq!(cumulative.last().unwrap(), &stats::running_totals(&s));
}
