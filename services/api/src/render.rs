use ctf_standings::standings::{
    CommandOutcome, EventStandings, Group, GroupReport, Leaderboard, Rank, RefreshOutcome,
    RemovalReport, ScoreReceipt, UpsertOutcome,
};

/// Plain-text rendering of a command outcome, one line per entry.
pub(crate) fn render_outcome(outcome: &CommandOutcome) -> String {
    let lines = match outcome {
        CommandOutcome::GroupAdded(group) => render_group_added(group),
        CommandOutcome::ScoreRecorded(receipt) => render_receipt(receipt),
        CommandOutcome::ParticipationWithdrawn(rankings) => {
            vec![
                "Participation withdrawn".to_string(),
                render_rankings(rankings),
            ]
        }
        CommandOutcome::GroupRemoved(report) => render_removal(report),
        CommandOutcome::Group(report) => render_group_report(report),
        CommandOutcome::Leaderboard(board) => render_leaderboard(board),
        CommandOutcome::Event(standings) => render_event(standings),
    };
    lines.join("\n")
}

fn rank_label(rank: Option<Rank>) -> String {
    rank.map_or_else(|| "-".to_string(), |rank| format!("#{rank}"))
}

fn render_rankings(rankings: &RefreshOutcome) -> String {
    match rankings {
        RefreshOutcome::Applied { updated } => {
            format!("- best ranks refreshed ({updated} group(s) changed)")
        }
        RefreshOutcome::Deferred { reason } => {
            format!("- best ranks NOT refreshed: {reason}")
        }
    }
}

fn render_group_added(group: &Group) -> Vec<String> {
    vec![format!("Group {} added: {}", group.id, group.description)]
}

fn render_receipt(receipt: &ScoreReceipt) -> Vec<String> {
    let verb = match receipt.write {
        UpsertOutcome::Inserted => "recorded",
        UpsertOutcome::Updated => "updated",
    };
    let row = &receipt.participation;
    vec![
        format!(
            "Score {verb}: {} ({}) scored {} in event {}",
            receipt.description, row.group_id, row.score, row.event_id
        ),
        render_rankings(&receipt.rankings),
    ]
}

fn render_removal(report: &RemovalReport) -> Vec<String> {
    let events = if report.events.is_empty() {
        "no events".to_string()
    } else {
        report
            .events
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    vec![
        format!(
            "Group {} removed: {} (events: {events})",
            report.group_id, report.description
        ),
        render_rankings(&report.rankings),
    ]
}

fn render_group_report(report: &GroupReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Group {}: {} | best rank {}",
        report.group_id,
        report.description,
        rank_label(report.best_rank)
    )];
    if report.cache_stale {
        lines.push("- best rank is stale; run a refresh".to_string());
    }
    if report.placements.is_empty() {
        lines.push("- no participations".to_string());
    }
    for placement in &report.placements {
        lines.push(format!(
            "- event {}: score {} | rank #{}",
            placement.event_id, placement.score, placement.rank
        ));
    }
    lines
}

fn render_leaderboard(board: &Leaderboard) -> Vec<String> {
    let mut lines = vec![format!(
        "Standings as of {}",
        board.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )];
    if board.groups.is_empty() {
        lines.push("- no groups registered".to_string());
    }
    for report in &board.groups {
        lines.push(format!(
            "{:>4}  {:>4}  {} ({} event(s))",
            rank_label(report.best_rank),
            report.group_id.0,
            report.description,
            report.placements.len()
        ));
    }
    lines
}

fn render_event(standings: &EventStandings) -> Vec<String> {
    let mut lines = vec![format!(
        "Event {} | {} participant(s)",
        standings.event_id, standings.participants
    )];
    for entry in &standings.entries {
        lines.push(format!(
            "#{:<3} {} ({}) {}",
            entry.rank, entry.description, entry.group_id, entry.score
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctf_standings::standings::{EventId, GroupId, Participation, StandingEntry};

    #[test]
    fn deferred_refresh_is_called_out() {
        let outcome = CommandOutcome::ScoreRecorded(ScoreReceipt {
            participation: Participation::new(EventId(4), GroupId(2), 120),
            description: "Segfault Society".to_string(),
            write: UpsertOutcome::Inserted,
            rankings: RefreshOutcome::Deferred {
                reason: "store unavailable".to_string(),
            },
        });

        let text = render_outcome(&outcome);
        assert_eq!(
            text,
            "Score recorded: Segfault Society (2) scored 120 in event 4\n\
             - best ranks NOT refreshed: store unavailable"
        );
    }

    #[test]
    fn event_lists_entries_in_rank_order() {
        let entry = |rank, group, description: &str, score| StandingEntry {
            rank,
            group_id: GroupId(group),
            description: description.to_string(),
            score,
        };
        let outcome = CommandOutcome::Event(EventStandings {
            event_id: EventId(10),
            participants: 2,
            winner: Some(entry(1, 3, "Stack Smashers", 90)),
            entries: vec![
                entry(1, 3, "Stack Smashers", 90),
                entry(2, 1, "Null Pointers", 50),
            ],
        });

        let lines: Vec<String> = render_outcome(&outcome)
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines[0], "Event 10 | 2 participant(s)");
        assert!(lines[1].starts_with("#1") && lines[1].contains("Stack Smashers (3) 90"));
        assert!(lines[2].starts_with("#2") && lines[2].contains("Null Pointers (1) 50"));
    }

    #[test]
    fn removal_without_events_says_so() {
        let outcome = CommandOutcome::GroupRemoved(RemovalReport {
            group_id: GroupId(7),
            description: "Idle Hands".to_string(),
            events: Vec::new(),
            rankings: RefreshOutcome::Applied { updated: 0 },
        });

        assert!(render_outcome(&outcome).starts_with("Group 7 removed: Idle Hands (events: no events)"));
    }
}
