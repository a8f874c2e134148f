//! Wizard states and the pure transition table.
//!
//! Nothing in here performs side effects: [`on_button`] maps a button press
//! in a given state to a [`Transition`], and [`entry_effect`] / [`screen`]
//! describe what entering a state must do and show. The [`super::Wizard`]
//! hub applies them.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardState {
    Welcome,
    CheckingConnectivity,
    Updating,
    UpdateFailed,
    SelectingSoftware,
    Applying,
    ApplyFailed,
    Success,
    ConfirmQuit,
}

impl WizardState {
    pub const ALL: [WizardState; 9] = [
        WizardState::Welcome,
        WizardState::CheckingConnectivity,
        WizardState::Updating,
        WizardState::UpdateFailed,
        WizardState::SelectingSoftware,
        WizardState::Applying,
        WizardState::ApplyFailed,
        WizardState::Success,
        WizardState::ConfirmQuit,
    ];

    pub fn short_name(&self) -> &'static str {
        match self {
            WizardState::Welcome => "Welcome",
            WizardState::CheckingConnectivity => "Network",
            WizardState::Updating => "Update",
            WizardState::UpdateFailed => "Update failed",
            WizardState::SelectingSoftware => "Software",
            WizardState::Applying => "Apply",
            WizardState::ApplyFailed => "Apply failed",
            WizardState::Success => "Done",
            WizardState::ConfirmQuit => "Quit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Ok,
    Yes,
    No,
    Cancel,
    Reset,
}

impl Button {
    pub const ALL: [Button; 5] = [Button::Ok, Button::Yes, Button::No, Button::Cancel, Button::Reset];

    pub fn label(&self) -> &'static str {
        match self {
            Button::Ok => "Ok",
            Button::Yes => "Yes",
            Button::No => "No",
            Button::Cancel => "Cancel",
            Button::Reset => "Reset",
        }
    }

    /// Keyboard shortcut shown next to the label
    pub fn shortcut(&self) -> char {
        match self {
            Button::Ok => 'o',
            Button::Yes => 'y',
            Button::No => 'n',
            Button::Cancel => 'c',
            Button::Reset => 'r',
        }
    }
}

/// Outcome of routing a button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Enter(WizardState),
    Quit,
}

/// Route a button pressed while `state` was current.
///
/// State-specific routes are evaluated first. Unless they end the
/// application, `No` and `Cancel` then always lead to [`WizardState::ConfirmQuit`].
pub fn on_button(state: WizardState, button: Button) -> Transition {
    let specific = match (state, button) {
        (WizardState::Welcome, Button::Ok) => Transition::Enter(WizardState::CheckingConnectivity),
        (WizardState::UpdateFailed, Button::Yes) => {
            Transition::Enter(WizardState::CheckingConnectivity)
        }
        (WizardState::SelectingSoftware, Button::Ok) => Transition::Enter(WizardState::Applying),
        (WizardState::SelectingSoftware, _) => Transition::Enter(WizardState::ConfirmQuit),
        (WizardState::ApplyFailed, Button::Yes) => Transition::Enter(WizardState::Applying),
        (WizardState::ApplyFailed, Button::Reset) => {
            Transition::Enter(WizardState::SelectingSoftware)
        }
        (WizardState::Success, Button::Ok) => Transition::Quit,
        (WizardState::ConfirmQuit, Button::No | Button::Ok) => Transition::Quit,
        (WizardState::ConfirmQuit, _) => Transition::Enter(WizardState::Welcome),
        _ => Transition::Stay,
    };

    match (specific, button) {
        (Transition::Quit, _) => Transition::Quit,
        (_, Button::No | Button::Cancel) => Transition::Enter(WizardState::ConfirmQuit),
        (specific, _) => specific,
    }
}

/// Side effect started when a state is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ProbeConnectivity,
    RunUpdate,
    PopulateSelection,
    ApplySelection,
}

pub fn entry_effect(state: WizardState) -> Option<Effect> {
    match state {
        WizardState::CheckingConnectivity => Some(Effect::ProbeConnectivity),
        WizardState::Updating => Some(Effect::RunUpdate),
        WizardState::SelectingSoftware => Some(Effect::PopulateSelection),
        WizardState::Applying => Some(Effect::ApplySelection),
        WizardState::Welcome
        | WizardState::UpdateFailed
        | WizardState::ApplyFailed
        | WizardState::Success
        | WizardState::ConfirmQuit => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    /// Static text with buttons
    Text,
    /// Spinner while an operation runs, no buttons
    Waiting,
    /// Tabs of checkable software groups
    Selection,
}

/// What the front end shows for a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub kind: ScreenKind,
    pub title: &'static str,
    pub text: &'static str,
    pub buttons: &'static [Button],
}

pub fn screen(state: WizardState) -> Screen {
    match state {
        WizardState::Welcome => Screen {
            kind: ScreenKind::Text,
            title: "Welcome",
            text: "Welcome to Snigdha OS! This wizard checks your internet connection, \
                   brings the system up to date and lets you pick optional software \
                   to install. Press Ok to begin.",
            buttons: &[Button::Ok, Button::Cancel],
        },
        WizardState::CheckingConnectivity => Screen {
            kind: ScreenKind::Waiting,
            title: "Network",
            text: "Waiting for an internet connection...",
            buttons: &[],
        },
        WizardState::Updating => Screen {
            kind: ScreenKind::Waiting,
            title: "Update",
            text: "Updating the system. Follow the instructions in the terminal window.",
            buttons: &[],
        },
        WizardState::UpdateFailed => Screen {
            kind: ScreenKind::Text,
            title: "Update failed",
            text: "The system update did not complete. Do you want to try again?",
            buttons: &[Button::Yes, Button::No],
        },
        WizardState::SelectingSoftware => Screen {
            kind: ScreenKind::Selection,
            title: "Software",
            text: "Select the software you want to install.",
            buttons: &[Button::Ok, Button::Cancel],
        },
        WizardState::Applying => Screen {
            kind: ScreenKind::Waiting,
            title: "Apply",
            text: "Installing the selected software. Follow the instructions in the terminal window.",
            buttons: &[],
        },
        WizardState::ApplyFailed => Screen {
            kind: ScreenKind::Text,
            title: "Apply failed",
            text: "Installing the selected software did not complete. Try again, \
                   or Reset to change the selection.",
            buttons: &[Button::Yes, Button::No, Button::Reset],
        },
        WizardState::Success => Screen {
            kind: ScreenKind::Text,
            title: "Done",
            text: "All done! Your system is ready to use.",
            buttons: &[Button::Ok],
        },
        WizardState::ConfirmQuit => Screen {
            kind: ScreenKind::Text,
            title: "Quit",
            text: "Do you want to quit the setup? Press Reset to start over.",
            buttons: &[Button::Ok, Button::Reset],
        },
    }
}

/// Token passed across a relaunch telling the new process where to resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeToken {
    PostUpdate,
    UpdateRetry,
    Fresh,
}

impl ResumeToken {
    pub fn parse(token: Option<&str>) -> Self {
        token.and_then(|t| t.parse().ok()).unwrap_or(ResumeToken::Fresh)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResumeToken::PostUpdate => "POST_UPDATE",
            ResumeToken::UpdateRetry => "UPDATE_RETRY",
            ResumeToken::Fresh => "",
        }
    }

    pub fn initial_state(&self) -> WizardState {
        match self {
            ResumeToken::PostUpdate => WizardState::SelectingSoftware,
            ResumeToken::UpdateRetry => WizardState::UpdateFailed,
            ResumeToken::Fresh => WizardState::Welcome,
        }
    }
}

impl FromStr for ResumeToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POST_UPDATE" => Ok(ResumeToken::PostUpdate),
            "UPDATE_RETRY" => Ok(ResumeToken::UpdateRetry),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
