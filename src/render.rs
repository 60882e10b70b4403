//! Text rendering of the board with status symbols.

use crate::board::{BoardState, LoadPhase};
use crate::models::ItemStatus;
use crate::views::{BoardStats, Card, QuarterColumn, SprintColumn, TeamBacklog};

const PLANNED: char = '◇';
const IN_PROGRESS: char = '○';
const COMPLETED: char = '●';
const CANCELLED: char = '✗';

pub const BACKLOG_HEADING: &str = "Team Backlog";

fn status_symbol(status: ItemStatus) -> char {
    match status {
        ItemStatus::Planned => PLANNED,
        ItemStatus::InProgress => IN_PROGRESS,
        ItemStatus::Completed => COMPLETED,
        ItemStatus::Cancelled => CANCELLED,
    }
}

/// Render the whole board, or the loading/error state if it is not ready.
///
/// Example output:
/// ```text
/// 3 items · 1 completed · 1 in progress · 33% complete
///
/// Q1 FY26
/// └── S1 (active, 2025-09-25 to 2025-10-08) 2 items
///     ├── ○ Checkout redesign [Payments · Web]
///     └── ● Card vault [Payments · Core]
///
/// Team Backlog
/// └── Payments
///     └── ◇ Refund flow [Payments · Unknown]
/// ```
pub fn render_board(state: &BoardState) -> String {
    match state.phase() {
        LoadPhase::Idle | LoadPhase::Loading => return "Loading roadmap...\n".to_string(),
        LoadPhase::Failed(message) => return format!("Failed to load roadmap: {}\n", message),
        LoadPhase::Ready => {}
    }

    let layout = state.layout();
    let mut output = String::new();

    if let Some(failure) = state.failure() {
        output.push_str(&format!("! {}\n\n", failure.message));
    }

    output.push_str(&render_stats(&layout.stats));
    output.push('\n');

    for quarter in &layout.quarters {
        output.push('\n');
        render_quarter(&mut output, quarter);
    }

    output.push('\n');
    render_backlogs(&mut output, &layout.backlogs);
    output
}

pub fn render_stats(stats: &BoardStats) -> String {
    format!(
        "{} items · {} completed · {} in progress · {}% complete",
        stats.total, stats.completed, stats.in_progress, stats.progress_percent
    )
}

fn render_quarter(output: &mut String, quarter: &QuarterColumn<'_>) {
    output.push_str(&quarter.label);
    output.push('\n');
    for (i, column) in quarter.sprints.iter().enumerate() {
        let is_last = i == quarter.sprints.len() - 1;
        push_line(output, "", is_last, &sprint_heading(column));
        render_cards(output, &child_prefix("", is_last), &column.cards);
    }
}

fn sprint_heading(column: &SprintColumn<'_>) -> String {
    let sprint = column.sprint;
    let count = match column.cards.len() {
        1 => "1 item".to_string(),
        n => format!("{} items", n),
    };
    format!(
        "{} ({}, {} to {}) {}",
        sprint.name, sprint.status, sprint.start_date, sprint.end_date, count
    )
}

fn render_backlogs(output: &mut String, backlogs: &[TeamBacklog<'_>]) {
    output.push_str(BACKLOG_HEADING);
    output.push('\n');
    for (i, backlog) in backlogs.iter().enumerate() {
        let is_last = i == backlogs.len() - 1;
        push_line(output, "", is_last, &backlog.team.name);
        render_cards(output, &child_prefix("", is_last), &backlog.cards);
    }
}

fn render_cards(output: &mut String, prefix: &str, cards: &[Card<'_>]) {
    for (i, card) in cards.iter().enumerate() {
        let is_last = i == cards.len() - 1;
        push_line(output, prefix, is_last, &card_line(card));
    }
}

/// One card: status symbol, title, team and domain, plus due date when set.
pub fn card_line(card: &Card<'_>) -> String {
    let item = card.item;
    let mut line = format!(
        "{} {} [{} · {}]",
        status_symbol(item.status),
        item.title,
        card.team_name,
        card.domain_name
    );
    if let Some(due) = item.due_date {
        line.push_str(&format!(" due {}", due));
    }
    line
}

fn push_line(output: &mut String, prefix: &str, is_last: bool, text: &str) {
    let branch = if is_last { "└── " } else { "├── " };
    output.push_str(prefix);
    output.push_str(branch);
    output.push_str(text);
    output.push('\n');
}

fn child_prefix(prefix: &str, is_last: bool) -> String {
    let continuation = if is_last { "    " } else { "│   " };
    format!("{}{}", prefix, continuation)
}
