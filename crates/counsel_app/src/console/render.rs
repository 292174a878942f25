use std::fmt::Write;

use counsel_core::{
    AppViewModel, ListView, NoticeLevel, QuickListView, Route, StudentView, SummaryView,
};

/// Renders the whole view model as plain text.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    let who = view.signed_in_as.as_deref().unwrap_or("not signed in");
    let _ = writeln!(
        out,
        "== {} | {} | pending writes: {} | live queries: {}",
        route_title(&view.route),
        who,
        view.pending_writes,
        view.active_subscriptions
    );
    if let Some(notice) = &view.notice {
        let tag = match notice.level {
            NoticeLevel::Info => "note",
            NoticeLevel::Validation => "check",
            NoticeLevel::Error => "ERROR",
        };
        let _ = writeln!(out, "[{tag}] {} (type 'dismiss')", notice.text);
    }

    match &view.route {
        Route::Checking => out.push_str("Checking sign-in...\n"),
        Route::Login => out.push_str("Please sign in to use the console.\n"),
        Route::Home => out.push_str("Type 'list', 'summary' or 'open <id>'.\n"),
        _ => {}
    }
    if let Some(list) = &view.list {
        render_list(&mut out, list);
    }
    if let Some(summary) = &view.summary {
        render_summary(&mut out, summary);
    }
    if let Some(student) = &view.student {
        render_student(&mut out, student);
    }
    out
}

fn route_title(route: &Route) -> String {
    match route {
        Route::Checking => "Starting".to_string(),
        Route::Login => "Login".to_string(),
        Route::Home => "Home".to_string(),
        Route::List => "Students".to_string(),
        Route::Summary => "Summary".to_string(),
        Route::Student(id) => format!("Student {id}"),
    }
}

fn render_list(out: &mut String, list: &ListView) {
    if list.loading {
        out.push_str("Loading students...\n");
        return;
    }
    let counts: Vec<String> = list
        .counts
        .iter()
        .map(|(stage, n)| format!("{stage}: {n}"))
        .collect();
    let _ = writeln!(
        out,
        "Search: '{}' | Status: {} | {} of {} | {}",
        list.query,
        list.status_filter.label(),
        list.rows.len(),
        list.total,
        counts.join(", ")
    );
    for row in &list.rows {
        let _ = writeln!(
            out,
            "  {:<12} {:<24} {:<28} {:<14} {:<13} {}",
            row.id, row.name, row.email, row.country, row.stage, row.last_active
        );
    }
    if list.rows.is_empty() {
        out.push_str("  (no matching students)\n");
    }
}

fn render_quick_list(out: &mut String, list: &QuickListView) {
    let _ = writeln!(out, "{} ({})", list.title, list.count);
    for entry in &list.entries {
        let _ = writeln!(out, "  {:<12} {}", entry.id, entry.label);
    }
    if list.count > list.entries.len() {
        let _ = writeln!(out, "  ... {} more", list.count - list.entries.len());
    }
}

fn render_summary(out: &mut String, summary: &SummaryView) {
    if summary.loading {
        out.push_str("Loading summary...\n");
        return;
    }
    let _ = writeln!(out, "Students: {}", summary.counts.total());
    for (stage, n) in summary.counts.iter() {
        let _ = writeln!(out, "  {stage:<13} {n}");
    }
    render_quick_list(out, &summary.not_contacted);
    render_quick_list(out, &summary.high_intent);
}

fn render_student(out: &mut String, student: &StudentView) {
    match &student.profile {
        Some(profile) => {
            let _ = writeln!(out, "{} <{}>", profile.name, profile.email);
            let _ = writeln!(
                out,
                "  Country: {} | Phone: {} | Grade: {} | Last active: {}",
                profile.country,
                profile.phone.as_deref().unwrap_or("-"),
                profile.grade.as_deref().unwrap_or("-"),
                profile.last_active
            );
            let _ = writeln!(
                out,
                "  Stage {} of 4: {} ({}%)",
                profile.stage_index + 1,
                profile.stage,
                profile.progress_percent
            );
        }
        None if student.loading => out.push_str("Loading profile...\n"),
        None => out.push_str("(no profile)\n"),
    }
    for slot in &student.stale {
        let _ = writeln!(out, "  ! {slot} could not be refreshed; showing last known data");
    }

    let _ = writeln!(out, "Timeline ({})", student.timeline.len());
    for row in &student.timeline {
        let _ = writeln!(out, "  {} [{}] {}", row.when, row.label, row.text);
    }

    let _ = writeln!(out, "Communications ({})", student.comm.len());
    for row in &student.comm {
        let subject = row.subject.as_deref().unwrap_or("");
        let _ = writeln!(
            out,
            "  {} {} {} {} {}",
            row.when, row.tag, row.route, subject, row.message
        );
    }

    let _ = writeln!(out, "Notes ({})", student.notes.len());
    for note in &student.notes {
        let edited = if note.edited { " (edited)" } else { "" };
        let _ = writeln!(
            out,
            "  {:<10} {} {}{}: {}",
            note.id, note.created, note.author, edited, note.text
        );
    }

    let _ = writeln!(out, "Tasks ({})", student.tasks.len());
    for task in &student.tasks {
        let mark = if task.done { "x" } else { " " };
        let _ = writeln!(
            out,
            "  [{mark}] {:<10} {} (due {}, {})",
            task.id, task.title, task.due, task.assignee
        );
    }

    if !student.note_draft.is_empty() {
        let _ = writeln!(out, "Draft note: {}", student.note_draft);
    }
    if let Some(editing) = &student.editing {
        let _ = writeln!(out, "Editing {}: {}", editing.note_id, editing.text);
    }
    let task = &student.task_draft;
    if !task.title.is_empty() || !task.due.is_empty() || !task.assignee.is_empty() {
        let _ = writeln!(
            out,
            "Draft task: {} | due {} | assignee {}",
            task.title, task.due, task.assignee
        );
    }
    let comm = &student.comm_draft;
    if !comm.message.is_empty() || !comm.subject.is_empty() {
        let _ = writeln!(
            out,
            "Draft {} {}: to '{}' from '{}' subject '{}' message '{}'",
            comm.channel.as_str(),
            comm.direction.as_str(),
            comm.to,
            comm.from,
            comm.subject,
            comm.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_core::{fields, update, AppState, DocumentPath, Effect, Identity, Msg, Query, Record};

    fn signed_in() -> AppState {
        let (state, _) = update(
            AppState::new(),
            Msg::IdentityResolved(Some(Identity {
                uid: "u1".to_string(),
                email: Some("c@school.org".to_string()),
            })),
        );
        state
    }

    #[test]
    fn login_route_asks_for_sign_in() {
        let (state, _) = update(AppState::new(), Msg::IdentityResolved(None));
        let text = render(&state.view());
        assert!(text.contains("Login"));
        assert!(text.contains("Please sign in"));
    }

    #[test]
    fn student_detail_shows_profile_and_progress() {
        let (state, effects) = update(
            signed_in(),
            Msg::StudentOpened {
                student_id: "s1".to_string(),
            },
        );
        let profile = effects
            .iter()
            .find_map(|effect| match effect {
                Effect::Subscribe { id, query }
                    if *query == Query::document(DocumentPath::student("s1")) =>
                {
                    Some(*id)
                }
                _ => None,
            })
            .unwrap();
        let (state, _) = update(
            state,
            Msg::SnapshotDelivered {
                subscription: profile,
                records: vec![Record::new(
                    "s1",
                    fields([("name", "Ana Li"), ("email", "ana@x.com"), ("status", "Applying")]),
                )],
            },
        );

        let text = render(&state.view());
        assert!(text.contains("== Student s1"));
        assert!(text.contains("Ana Li <ana@x.com>"));
        assert!(text.contains("Stage 3 of 4: Applying (75%)"));
    }
}
