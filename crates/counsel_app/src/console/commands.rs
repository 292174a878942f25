//! Operator command line to messages.

use chrono::{DateTime, Utc};
use counsel_core::{CommChannel, CommDirection, CommDraftEdit, Msg, StatusFilter};

pub const HELP: &str = "\
Views:      list | summary | open <student-id> | close | sign-out | quit
List:       search <text> | filter <All|Exploring|Shortlisting|Applying|Submitted>
Notes:      note <text> | edit <note-id> | edit-text <text> | save | cancel | delete-note <note-id>
Tasks:      task <title> | due <YYYY-MM-DD HH:MM> | assignee <name> | add-task
            toggle <task-id> | remove-task <task-id>
Comms:      comm-channel <email|sms> | comm-direction <out|in> | comm-to <addr>
            comm-from <addr> | comm-subject <text> | comm <message> | log-comm | follow-up
Other:      dismiss | help";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Messages to feed through `update`, in order.
    Send(Vec<Msg>),
    Help,
    Quit,
    Invalid(String),
}

fn send(msg: Msg) -> Command {
    Command::Send(vec![msg])
}

fn required(verb: &str, arg: &str, what: &str) -> Result<String, Command> {
    if arg.is_empty() {
        Err(Command::Invalid(format!("{verb} needs {what}")))
    } else {
        Ok(arg.to_string())
    }
}

/// Parses one input line. `now` anchors the summary's contact window.
pub fn parse(line: &str, now: DateTime<Utc>) -> Command {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let parsed = match verb {
        "" => Ok(Command::Send(Vec::new())),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "list" => Ok(send(Msg::ListOpened)),
        "summary" => Ok(send(Msg::SummaryOpened { now })),
        "open" => required(verb, arg, "a student id")
            .map(|student_id| send(Msg::StudentOpened { student_id })),
        "close" => Ok(send(Msg::ViewClosed)),
        "sign-out" => Ok(send(Msg::SignOutClicked)),
        "search" => Ok(send(Msg::SearchChanged(arg.to_string()))),
        "filter" => match StatusFilter::parse(arg) {
            Some(filter) => Ok(send(Msg::StatusFilterChanged(filter))),
            None => Err(Command::Invalid(format!("unknown status filter '{arg}'"))),
        },
        "note" => Ok(Command::Send(vec![
            Msg::NoteDraftChanged(arg.to_string()),
            Msg::NoteSubmitted,
        ])),
        "edit" => required(verb, arg, "a note id")
            .map(|note_id| send(Msg::NoteEditStarted { note_id })),
        "edit-text" => Ok(send(Msg::NoteEditChanged(arg.to_string()))),
        "save" => Ok(send(Msg::NoteEditSaved)),
        "cancel" => Ok(send(Msg::NoteEditCancelled)),
        "delete-note" => required(verb, arg, "a note id")
            .map(|note_id| send(Msg::NoteDeleted { note_id })),
        "task" => Ok(send(Msg::TaskTitleChanged(arg.to_string()))),
        "due" => Ok(send(Msg::TaskDueChanged(arg.to_string()))),
        "assignee" => Ok(send(Msg::TaskAssigneeChanged(arg.to_string()))),
        "add-task" => Ok(send(Msg::TaskSubmitted)),
        "toggle" => required(verb, arg, "a task id")
            .map(|task_id| send(Msg::TaskToggled { task_id })),
        "remove-task" => required(verb, arg, "a task id")
            .map(|task_id| send(Msg::TaskRemoved { task_id })),
        "comm-channel" => match CommChannel::parse(arg) {
            Some(channel) => Ok(send(Msg::CommDraftChanged(CommDraftEdit::Channel(channel)))),
            None => Err(Command::Invalid("channel must be email or sms".to_string())),
        },
        "comm-direction" => match CommDirection::parse(arg) {
            Some(direction) => Ok(send(Msg::CommDraftChanged(CommDraftEdit::Direction(
                direction,
            )))),
            None => Err(Command::Invalid("direction must be out or in".to_string())),
        },
        "comm-to" => Ok(send(Msg::CommDraftChanged(CommDraftEdit::To(arg.to_string())))),
        "comm-from" => Ok(send(Msg::CommDraftChanged(CommDraftEdit::From(
            arg.to_string(),
        )))),
        "comm-subject" => Ok(send(Msg::CommDraftChanged(CommDraftEdit::Subject(
            arg.to_string(),
        )))),
        "comm" => Ok(send(Msg::CommDraftChanged(CommDraftEdit::Message(
            arg.to_string(),
        )))),
        "log-comm" => Ok(send(Msg::CommLogged)),
        "follow-up" => Ok(send(Msg::FollowUpTriggered)),
        "dismiss" => Ok(send(Msg::NoticeDismissed)),
        other => Err(Command::Invalid(format!(
            "unknown command '{other}'; type 'help' for the list"
        ))),
    };
    parsed.unwrap_or_else(|invalid| invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use counsel_core::Stage;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn view_commands() {
        assert_eq!(parse("list", now()), Command::Send(vec![Msg::ListOpened]));
        assert_eq!(
            parse("  summary ", now()),
            Command::Send(vec![Msg::SummaryOpened { now: now() }])
        );
        assert_eq!(
            parse("open s42", now()),
            Command::Send(vec![Msg::StudentOpened {
                student_id: "s42".to_string()
            }])
        );
        assert_eq!(parse("quit", now()), Command::Quit);
    }

    #[test]
    fn note_sets_draft_then_submits() {
        assert_eq!(
            parse("note Called about   essays", now()),
            Command::Send(vec![
                Msg::NoteDraftChanged("Called about   essays".to_string()),
                Msg::NoteSubmitted,
            ])
        );
    }

    #[test]
    fn filter_parses_stage_labels() {
        assert_eq!(
            parse("filter Applying", now()),
            Command::Send(vec![Msg::StatusFilterChanged(StatusFilter::Only(
                Stage::Applying
            ))])
        );
        assert_eq!(
            parse("filter All", now()),
            Command::Send(vec![Msg::StatusFilterChanged(StatusFilter::All)])
        );
        assert!(matches!(parse("filter Nope", now()), Command::Invalid(_)));
    }

    #[test]
    fn comm_form_edits() {
        assert_eq!(
            parse("comm-direction in", now()),
            Command::Send(vec![Msg::CommDraftChanged(CommDraftEdit::Direction(
                CommDirection::Inbound
            ))])
        );
        assert_eq!(
            parse("comm-channel sms", now()),
            Command::Send(vec![Msg::CommDraftChanged(CommDraftEdit::Channel(
                CommChannel::Sms
            ))])
        );
        assert!(matches!(parse("comm-channel fax", now()), Command::Invalid(_)));
    }

    #[test]
    fn missing_ids_and_unknown_verbs_are_invalid() {
        assert!(matches!(parse("open", now()), Command::Invalid(_)));
        assert!(matches!(parse("toggle   ", now()), Command::Invalid(_)));
        assert!(matches!(parse("launch", now()), Command::Invalid(_)));
        assert_eq!(parse("", now()), Command::Send(Vec::new()));
    }
}
