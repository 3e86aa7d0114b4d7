use crate::cmd::describe_outcome;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use scorekeep::aggregate::{ChartSeries, PlayerSummary};
use scorekeep::session::round::ScoringMode;
use scorekeep::session::{stats, Session};
use scorekeep::settlement::SettlementDetails;
use scorekeep::state::AppState;
use scorekeep::util::local_timestamp;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn align_right(table: &mut Table, columns: std::ops::Range<usize>) {
    for i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn score_cell(value: i64) -> Cell {
    let cell = Cell::new(value);
    match value.signum() {
        1 => cell.fg(Color::Green),
        -1 => cell.fg(Color::Red),
        _ => cell,
    }
}

fn header(first: &str, names: &[String]) -> Vec<Cell> {
    let mut row = vec![Cell::new(first).add_attribute(Attribute::Bold)];
    row.extend(names.iter().map(|n| Cell::new(n).add_attribute(Attribute::Bold)));
    row
}

pub fn print_sessions(state: &AppState) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("").add_attribute(Attribute::Bold),
        Cell::new("Id").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Mode"),
        Cell::new("Players"),
        Cell::new("Rounds"),
        Cell::new("Target"),
    ]);
    for s in &state.sessions {
        let marker = if s.id == state.current_session_id { "*" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(&s.id),
            Cell::new(&s.name),
            Cell::new(s.scoring_mode),
            Cell::new(s.players.join(", ")),
            Cell::new(s.rounds.len()),
            Cell::new(s.target_round_count.map_or("-".to_string(), |t| t.to_string())),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_session(session: &Session) {
    println!(
        "\n📋 {} [{}] ({} mode)",
        session.name, session.id, session.scoring_mode
    );
    let mut table = new_table();
    let mut head = header("#", &session.players);
    head.insert(1, Cell::new("Time"));
    head.push(Cell::new("Detail"));
    table.add_row(head);

    let n = session.player_count();
    for round in &session.rounds {
        let mut row = vec![Cell::new(round.id), Cell::new(local_timestamp(&round.timestamp))];
        row.extend(round.scores.iter().map(|&v| score_cell(v)));
        let mut detail = round
            .outcome()
            .map(|o| describe_outcome(o, &session.players))
            .unwrap_or_default();
        if !round.is_balanced() {
            detail = format!("⚠️ sum {} {}", round.total(), detail);
        }
        row.push(Cell::new(detail));
        table.add_row(row);
    }

    let mut total = vec![Cell::new("Total").add_attribute(Attribute::Bold), Cell::new("")];
    total.extend(
        stats::running_totals(session)
            .into_iter()
            .map(|v| score_cell(v).add_attribute(Attribute::Bold)),
    );
    total.push(Cell::new(""));
    table.add_row(total);

    let mut extra = vec![Cell::new(""), Cell::new("")];
    match session.scoring_mode {
        ScoringMode::Standard => {
            extra[1] = Cell::new("Wins");
            extra.extend(stats::win_counts(session).into_iter().map(Cell::new));
        }
        ScoringMode::Mahjong => {
            extra[1] = Cell::new("Sets");
            extra.extend(
                stats::set_counts(session)
                    .into_iter()
                    .map(|c| Cell::new(format!("C{}/E{}", c.concealed, c.exposed))),
            );
        }
    }
    extra.push(Cell::new(""));
    table.add_row(extra);

    align_right(&mut table, 2..2 + n);
    println!("{}", table);

    if let Some(target) = session.target_round_count {
        println!("🎯 {}/{} rounds", session.rounds.len(), target);
    }
}

pub fn print_settlement(names: &[String], details: &SettlementDetails) {
    let mut table = new_table();
    table.add_row(header("Step", names));
    for (label, values) in details.steps() {
        let mut row = vec![Cell::new(label)];
        row.extend(values.iter().map(|&v| score_cell(v)));
        table.add_row(row);
    }
    let mut total = vec![Cell::new("total").add_attribute(Attribute::Bold)];
    total.extend(
        details
            .total
            .iter()
            .map(|&v| score_cell(v).add_attribute(Attribute::Bold)),
    );
    table.add_row(total);
    align_right(&mut table, 1..1 + names.len());
    println!("\n{}", table);
}

pub fn print_summary(rows: &[PlayerSummary]) {
    let mut table = new_table();
    table.add_row(vec![
        Cell::new("Player").add_attribute(Attribute::Bold),
        Cell::new("Total").fg(Color::Cyan),
        Cell::new("Wins"),
        Cell::new("Concealed"),
        Cell::new("Exposed"),
        Cell::new("Rounds"),
        Cell::new("Sessions"),
    ]);
    for p in rows {
        table.add_row(vec![
            Cell::new(&p.name).add_attribute(Attribute::Bold),
            score_cell(p.total),
            Cell::new(p.wins),
            Cell::new(p.concealed),
            Cell::new(p.exposed_charged),
            Cell::new(p.rounds_played),
            Cell::new(p.sessions),
        ]);
    }
    align_right(&mut table, 1..7);
    println!("\n{}", table);
}

pub fn print_chart(series: &[ChartSeries]) {
    let Some(first) = series.first() else {
        return;
    };
    let names: Vec<String> = series.iter().map(|s| s.player.clone()).collect();
    let mut table = new_table();
    table.add_row(header("After", &names));
    for step in 0..first.points.len() {
        let mut row = vec![Cell::new(step)];
        row.extend(series.iter().map(|s| score_cell(s.points[step])));
        table.add_row(row);
    }
    align_right(&mut table, 1..1 + names.len());
    println!("\n📈 Cumulative\n{}", table);
}
