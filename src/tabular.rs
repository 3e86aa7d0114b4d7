//! CSV export and import of sessions.
//!
//! Files are UTF-8 with a byte-order mark, CRLF line endings and every field
//! quoted. Two layouts exist: the single-session sheet and the versioned
//! multi-session workbook (`Version,2`). Import sniffs which one it got.

use crate::consts::{CSV_VERSION, CUMULATIVE_SUFFIX, MAX_ABS_SCORE, MAX_PLAYERS, MIN_PLAYERS};
use crate::error::{ScoreKeepError, SkResult};
use crate::session::round::{Round, RoundKind, ScoringMode};
use crate::session::{stats, Session};
use crate::util::{local_timestamp, new_session_id, parse_timestamp};
use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::str::FromStr;

const BOM: &str = "\u{feff}";

type Row = Vec<String>;

fn import_err(msg: impl Into<String>) -> ScoreKeepError {
    ScoreKeepError::Import(msg.into())
}

fn write_rows(rows: &[Row]) -> SkResult<String> {
    let mut out: Vec<u8> = BOM.as_bytes().to_vec();
    for row in rows {
        if row.is_empty() {
            out.extend_from_slice(b"\r\n");
            continue;
        }
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .quote_style(QuoteStyle::Always)
            .flexible(true)
            .from_writer(&mut out);
        wtr.write_record(row)?;
        wtr.flush()?;
    }
    String::from_utf8(out).map_err(|e| ScoreKeepError::Validation(e.to_string()))
}

fn column_header(session: &Session) -> Row {
    let mut row = vec!["Round".to_string(), "Timestamp".to_string()];
    row.extend(session.players.iter().cloned());
    row.extend(
        session
            .players
            .iter()
            .map(|p| format!("{} {}", p, CUMULATIVE_SUFFIX)),
    );
    row
}

fn round_rows(session: &Session) -> Vec<Row> {
    let cumulative = stats::cumulative_totals(session);
    session
        .rounds
        .iter()
        .zip(cumulative)
        .enumerate()
        .map(|(i, (round, running))| {
            let mut row = vec![(i + 1).to_string(), local_timestamp(&round.timestamp)];
            row.extend(round.scores.iter().map(i64::to_string));
            row.extend(running.iter().map(i64::to_string));
            row
        })
        .collect()
}

fn total_row(session: &Session) -> Row {
    let mut row = vec!["Total".to_string(), String::new()];
    row.extend(stats::running_totals(session).iter().map(i64::to_string));
    match session.scoring_mode {
        ScoringMode::Standard => {
            row.extend(stats::win_counts(session).iter().map(usize::to_string));
        }
        ScoringMode::Mahjong => {
            row.extend(
                stats::set_counts(session)
                    .iter()
                    .map(|c| format!("C{}/E{}", c.concealed, c.exposed)),
            );
        }
    }
    row
}

/// Single-session sheet.
pub fn export_session(session: &Session, generated_at: DateTime<Utc>) -> SkResult<String> {
    let mut rows = vec![vec![
        "Generated At".to_string(),
        local_timestamp(&generated_at),
        "Mode".to_string(),
        session.scoring_mode.to_string(),
    ]];
    rows.push(column_header(session));
    rows.extend(round_rows(session));
    rows.push(total_row(session));
    write_rows(&rows)
}

/// Multi-session workbook, version 2.
pub fn export_sessions(sessions: &[Session], generated_at: DateTime<Utc>) -> SkResult<String> {
    let mut rows = vec![
        vec!["Generated At".to_string(), local_timestamp(&generated_at)],
        vec!["Version".to_string(), CSV_VERSION.to_string()],
    ];
    for session in sessions {
        rows.push(vec![
            "Session".to_string(),
            session.id.clone(),
            session.name.clone(),
            "CreatedAt".to_string(),
            session.created_at.to_rfc3339(),
            "Mode".to_string(),
            session.scoring_mode.to_string(),
        ]);
        let mut players = vec!["Players".to_string()];
        players.extend(session.players.iter().cloned());
        rows.push(players);
        rows.push(column_header(session));
        rows.extend(round_rows(session));
        rows.push(total_row(session));
        rows.push(Vec::new());
    }
    write_rows(&rows)
}

/// File name suggested for a single-session export.
pub fn export_file_name(session: &Session, generated_at: DateTime<Utc>) -> String {
    let safe: String = session
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}.csv", safe, generated_at.format("%Y%m%d_%H%M%S"))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

fn read_rows(text: &str) -> SkResult<Vec<Row>> {
    let text = text.trim_start_matches(BOM);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        // Cells keep their whitespace: player names may carry it.
        let row: Row = record.iter().map(str::to_string).collect();
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

fn first_cell(row: &Row) -> &str {
    row.first().map_or("", |c| c.trim())
}

/// Width of `row` ignoring trailing blank cells left behind by spreadsheet editors.
fn trimmed_width(row: &Row) -> usize {
    row.iter()
        .rposition(|c| !c.trim().is_empty())
        .map_or(0, |i| i + 1)
}

fn cell_is(row: &Row, i: usize, label: &str) -> bool {
    row.get(i).is_some_and(|c| c.trim().eq_ignore_ascii_case(label))
}

fn value_after(row: &Row, label: &str) -> Option<String> {
    row.iter()
        .position(|c| c.trim().eq_ignore_ascii_case(label))
        .and_then(|i| row.get(i + 1))
        .map(|c| c.trim().to_string())
}

fn is_marker(row: &Row, marker: &str) -> bool {
    first_cell(row).eq_ignore_ascii_case(marker)
}

fn parse_score(cell: &str, line: usize) -> SkResult<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    let value = cell
        .parse::<i64>()
        .map_err(|_| import_err(format!("row {}: '{}' is not a whole number", line, cell)))?;
    if value.abs() > MAX_ABS_SCORE {
        return Err(import_err(format!(
            "row {}: {} is outside ±{}",
            line, value, MAX_ABS_SCORE
        )));
    }
    Ok(value)
}

fn check_count(n: usize) -> SkResult<()> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
        return Err(import_err(format!(
            "player count {} is outside {}-{}",
            n, MIN_PLAYERS, MAX_PLAYERS
        )));
    }
    Ok(())
}

/// Reads round rows from `rows[*pos]` until a `Total` row or the end.
/// `score_offset` is the column of the first score.
fn read_rounds(
    rows: &[Row],
    pos: &mut usize,
    player_count: usize,
    score_offset: usize,
) -> SkResult<Vec<Round>> {
    let mut rounds = Vec::new();
    while *pos < rows.len() {
        let row = &rows[*pos];
        if is_marker(row, "total") {
            *pos += 1;
            break;
        }
        if is_marker(row, "session") {
            break;
        }
        let line = *pos + 1;
        if row.len() < score_offset + player_count {
            return Err(import_err(format!(
                "row {}: expected {} scores, found {} columns",
                line,
                player_count,
                row.len()
            )));
        }
        let scores = row[score_offset..score_offset + player_count]
            .iter()
            .map(|c| parse_score(c, line))
            .collect::<SkResult<Vec<i64>>>()?;
        let timestamp = if score_offset > 1 {
            parse_timestamp(&row[1]).unwrap_or_else(Utc::now)
        } else {
            Utc::now()
        };
        rounds.push(Round {
            id: rounds.len() as u64 + 1,
            scores,
            timestamp,
            kind: RoundKind::Standard,
        });
        *pos += 1;
    }
    Ok(rounds)
}

fn assemble(
    id: String,
    name: String,
    players: Vec<String>,
    mode: ScoringMode,
    created_at: DateTime<Utc>,
    rounds: Vec<Round>,
) -> Session {
    Session {
        id,
        name,
        players,
        next_round_id: rounds.len() as u64 + 1,
        rounds,
        scoring_mode: mode,
        target_round_count: None,
        rule_config: None,
        created_at,
    }
}

fn parse_mode(raw: Option<String>) -> ScoringMode {
    raw.and_then(|m| ScoringMode::from_str(&m).ok())
        .unwrap_or_default()
}

fn import_legacy(rows: &[Row]) -> SkResult<Vec<Session>> {
    let mut pos = 0;
    let mut mode = ScoringMode::Standard;
    if rows.first().is_some_and(|r| is_marker(r, "generated at")) {
        mode = parse_mode(value_after(&rows[0], "mode"));
        pos += 1;
    }

    let header = rows
        .get(pos)
        .filter(|r| is_marker(r, "round"))
        .ok_or_else(|| import_err("missing 'Round' header row"))?;
    pos += 1;

    // Scores and totals pair up, so the column count decides whether the
    // second cell is a timestamp column or the first player.
    let width = trimmed_width(header);
    let offset = if (width - 1) % 2 == 0 {
        1
    } else if cell_is(header, 1, "timestamp") {
        2
    } else {
        return Err(import_err(format!(
            "header has {} columns, which does not split into scores and totals",
            width
        )));
    };
    let n = (width - offset) / 2;
    check_count(n)?;

    let players = header[offset..offset + n].to_vec();
    let rounds = read_rounds(rows, &mut pos, n, offset)?;
    let now = Utc::now();
    Ok(vec![assemble(
        new_session_id(),
        format!("Imported {}", local_timestamp(&now)),
        players,
        mode,
        now,
        rounds,
    )])
}

fn import_v2(rows: &[Row], start: usize) -> SkResult<Vec<Session>> {
    let mut sessions = Vec::new();
    let mut pos = start;

    while pos < rows.len() {
        let head = &rows[pos];
        if !is_marker(head, "session") {
            return Err(import_err(format!(
                "row {}: expected 'Session' row, found '{}'",
                pos + 1,
                first_cell(head)
            )));
        }
        let id = head.get(1).map(|c| c.trim().to_string()).unwrap_or_default();
        let name = head.get(2).cloned().unwrap_or_default();
        let created_at = value_after(head, "createdat")
            .and_then(|s| parse_timestamp(&s))
            .unwrap_or_else(Utc::now);
        let mode = parse_mode(value_after(head, "mode"));
        pos += 1;

        let players_row = rows
            .get(pos)
            .filter(|r| is_marker(r, "players"))
            .ok_or_else(|| import_err(format!("session '{}': missing 'Players' row", name)))?;
        pos += 1;

        let header = rows
            .get(pos)
            .filter(|r| is_marker(r, "round"))
            .ok_or_else(|| import_err(format!("session '{}': missing 'Round' header row", name)))?;
        let width = trimmed_width(header);
        if width < 2 || (width - 2) % 2 != 0 {
            return Err(import_err(format!(
                "session '{}': header has {} columns, which does not split into scores and totals",
                name, width
            )));
        }
        let n = (width - 2) / 2;
        check_count(n)?;

        // Names may be blank, so only cells past the roster width may be dropped.
        let names = &players_row[1..];
        if names.len() < n || names[n..].iter().any(|c| !c.trim().is_empty()) {
            return Err(import_err(format!(
                "session '{}': 'Players' row lists {} names for {} score columns",
                name,
                names.len(),
                n
            )));
        }
        let players = names[..n].to_vec();
        pos += 1;

        let rounds = read_rounds(rows, &mut pos, players.len(), 2)?;
        let id = if id.is_empty() { new_session_id() } else { id };
        sessions.push(assemble(id, name, players, mode, created_at, rounds));
    }

    if sessions.is_empty() {
        return Err(import_err("workbook contains no sessions"));
    }
    Ok(sessions)
}

/// Parses either layout. Nothing is returned unless the whole file parses.
pub fn import(text: &str) -> SkResult<Vec<Session>> {
    let rows = read_rows(text)?;
    if rows.is_empty() {
        return Err(import_err("file is empty"));
    }

    let version_at = rows.iter().take(2).position(|r| is_marker(r, "version"));
    match version_at {
        Some(i) if cell_is(&rows[i], 1, CSV_VERSION) => {
            import_v2(&rows, i + 1)
        }
        Some(i) => {
            let mut rest = rows.clone();
            rest.remove(i);
            import_legacy(&rest)
        }
        None => import_legacy(&rows),
    }
}
