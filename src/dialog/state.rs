//! Dialog states, inputs and the transition table between them.

use crate::transport::labels;

/// Where a user is in the guided dialog. A user without a state is idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState {
    AwaitingId,
    ChoosingSubject,
}

/// A classified inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Start,
    Cancel,
    Begin,
    EnterId,
    AnotherSubject,
    Text(String),
}

const CANCEL_WORDS: &[&str] = &[labels::CANCEL, "Вернуться назад", "cancel"];
const BEGIN_WORDS: &[&str] = &[labels::BEGIN, "begin"];
const ENTER_ID_WORDS: &[&str] = &[labels::ENTER_ID, "enter id"];
const ANOTHER_SUBJECT_WORDS: &[&str] = &[labels::ANOTHER_SUBJECT, "another subject"];

impl Input {
    /// Classifies a message by its trimmed, case-folded text.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let folded = text.to_lowercase();
        let is_any = |words: &[&str]| words.iter().any(|w| w.to_lowercase() == folded);

        if folded == "/start" {
            Input::Start
        } else if is_any(CANCEL_WORDS) {
            Input::Cancel
        } else if is_any(BEGIN_WORDS) {
            Input::Begin
        } else if is_any(ENTER_ID_WORDS) {
            Input::EnterId
        } else if is_any(ANOTHER_SUBJECT_WORDS) {
            Input::AnotherSubject
        } else {
            Input::Text(text.to_string())
        }
    }
}

/// What the dialog does in response to an input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Greet and offer the "begin" option.
    Greet,
    /// Delete the user's record and go back to the main menu.
    Reset,
    ShowMainMenu,
    /// Forget the previous selection and wait for a record-book number.
    PromptForId,
    /// Idle user typed something that is not a command.
    Hint,
    /// Validate the text as a record-book number and subscribe.
    SubmitId(String),
    ShowSubjects,
    /// Treat the text as a subject number.
    PickSubject(String),
}

impl Action {
    /// Whether the action is subject to the site's opening hours.
    pub fn needs_site(&self) -> bool {
        matches!(self, Action::ShowSubjects | Action::PickSubject(_))
    }
}

/// The transition table. Commands apply in every state; free text is
/// interpreted by the current state.
pub fn transition(state: Option<DialogState>, input: &Input) -> Action {
    use DialogState::*;

    match (state, input) {
        (_, Input::Start) => Action::Greet,
        (_, Input::Cancel) => Action::Reset,
        (_, Input::Begin) => Action::ShowMainMenu,
        (_, Input::EnterId) => Action::PromptForId,

        (None, Input::AnotherSubject | Input::Text(_)) => Action::Hint,

        (Some(AwaitingId), Input::Text(text)) => Action::SubmitId(text.clone()),
        (Some(AwaitingId), Input::AnotherSubject) => {
            Action::SubmitId(labels::ANOTHER_SUBJECT.to_string())
        }

        (Some(ChoosingSubject), Input::AnotherSubject) => Action::ShowSubjects,
        (Some(ChoosingSubject), Input::Text(text)) => Action::PickSubject(text.clone()),
    }
}
