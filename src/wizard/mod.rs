mod apply;
pub mod config;
mod connectivity;
mod error;
mod executor;
mod host;
mod plan;
mod relaunch;
mod selection;
mod service;
pub mod state;
mod update;
pub mod ui;
mod widgets;

pub use apply::ApplyOutcome;
pub use config::{BlackboxConfig, GroupSourceConfig, ServiceRule};
pub use error::WizardError;
pub use host::HostContext;
pub use plan::InstallationPlan;
pub use relaunch::{ExecutableStamp, Relaunch, RelaunchRequest, exec};
pub use selection::{SelectionModel, SoftwareGroup, SoftwareItem};
pub use service::{SystemService, TerminalJob, create_service};
pub use state::{Button, ResumeToken, ScreenKind, Transition, WizardState};
pub use update::UpdateOutcome;
pub use widgets::StatusBarState;

use std::sync::Arc;

use crate::ui::Theme;
use crossterm::event::{KeyCode, KeyEvent};
use state::Effect;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Completion reports from background operations
#[derive(Debug)]
pub enum WizardMessage {
    ConnectivityRestored { attempts: u32 },
    UpdateFinished(UpdateOutcome),
    ApplyFinished(ApplyOutcome),
}

/// Actions the main loop has to carry out for the wizard
#[derive(Debug, PartialEq, Eq)]
pub enum WizardAction {
    /// Restore the terminal and replace the process
    Relaunch(RelaunchRequest),
    /// Leave the application
    Quit,
}

/// Message displayed to the user
pub struct Message {
    pub text: String,
    pub is_error: bool,
}

/// The wizard state machine and everything it drives
pub struct Wizard {
    pub config: BlackboxConfig,
    pub theme: Theme,
    pub selection: SelectionModel,

    state: WizardState,
    host: HostContext,
    stamp: ExecutableStamp,
    service: Arc<dyn SystemService>,
    tx: mpsc::UnboundedSender<WizardMessage>,

    // Presentation state
    pub focused_button: usize,
    pub message: Option<Message>,
    pub status_bar: StatusBarState,
    spinner_frame: usize,
    attention: bool,
}

impl Wizard {
    /// Create the wizard in the `Welcome` state. Completion messages of the
    /// operations it starts arrive on the returned receiver.
    pub fn new(
        config: BlackboxConfig,
        host: HostContext,
        stamp: ExecutableStamp,
        service: Arc<dyn SystemService>,
    ) -> (Self, mpsc::UnboundedReceiver<WizardMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let wizard = Self {
            config,
            theme: Theme::default(),
            selection: SelectionModel::default(),
            state: WizardState::Welcome,
            host,
            stamp,
            service,
            tx,
            focused_button: 0,
            message: None,
            status_bar: StatusBarState::for_screen(ScreenKind::Text),
            spinner_frame: 0,
            attention: false,
        };
        (wizard, rx)
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn is_dryrun(&self) -> bool {
        self.config.general.dryrun
    }

    /// Enter the state a (re)started process resumes into
    pub fn resume(&mut self, token: ResumeToken) {
        info!("Resuming with token {:?}", token);
        self.attention = true;
        self.enter_state(token.initial_state());
    }

    /// Switch to `new` and run its entry effect. Entering the current state does nothing.
    pub fn enter_state(&mut self, new: WizardState) {
        if new == self.state {
            return;
        }

        info!("State {:?} -> {:?}", self.state, new);
        self.state = new;
        self.focused_button = 0;
        self.attention = true;
        self.status_bar = StatusBarState::for_screen(state::screen(new).kind);

        if let Some(effect) = state::entry_effect(new) {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        debug!("Running effect {:?}", effect);
        match effect {
            Effect::ProbeConnectivity => {
                if self.host.selfupdate {
                    info!("Self-update session, skipping connectivity check");
                    self.enter_state(WizardState::SelectingSoftware);
                    return;
                }
                self.spawn_probe();
            }
            Effect::RunUpdate => {
                if self.host.selfupdate {
                    info!("Self-update session, skipping system update");
                    self.enter_state(WizardState::SelectingSoftware);
                    return;
                }
                self.spawn_update();
            }
            Effect::PopulateSelection => {
                self.selection.populate(&self.config.selection, &self.host);
            }
            Effect::ApplySelection => {
                let plan = InstallationPlan::build(
                    self.selection.checked_items(),
                    &self.config.policy.services,
                );
                if plan.is_empty() {
                    info!("Nothing selected, skipping apply");
                    self.enter_state(WizardState::Success);
                    return;
                }
                self.spawn_apply(plan);
            }
        }
    }

    fn spawn_probe(&self) {
        let service = self.service.clone();
        let url = self.config.connectivity.url.clone();
        let timeout = self.config.connectivity.timeout();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let attempts = connectivity::wait_until_reachable(service, url, timeout).await;
            let _ = tx.send(WizardMessage::ConnectivityRestored { attempts });
        });
    }

    fn spawn_update(&self) {
        let service = self.service.clone();
        let command = self.config.commands.update_command.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = update::run_update(service, command).await;
            let _ = tx.send(WizardMessage::UpdateFinished(outcome));
        });
    }

    fn spawn_apply(&self, plan: InstallationPlan) {
        let service = self.service.clone();
        let script = self.config.commands.apply_script.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = apply::run_apply(service, script, plan).await;
            let _ = tx.send(WizardMessage::ApplyFinished(outcome));
        });
    }

    /// Route a button press through the transition table
    pub fn press(&mut self, button: Button) -> Option<WizardAction> {
        debug!("{:?} pressed in {:?}", button, self.state);
        match state::on_button(self.state, button) {
            Transition::Stay => None,
            Transition::Enter(next) => {
                self.enter_state(next);
                None
            }
            Transition::Quit => Some(WizardAction::Quit),
        }
    }

    /// Handle an operation's completion report
    pub fn handle_message(&mut self, msg: WizardMessage) -> Option<WizardAction> {
        match msg {
            WizardMessage::ConnectivityRestored { attempts } => {
                if self.state != WizardState::CheckingConnectivity {
                    warn!("Ignoring connectivity result in {:?}", self.state);
                    return None;
                }
                debug!("Connected after {} attempt(s)", attempts);
                self.enter_state(WizardState::Updating);
                None
            }
            WizardMessage::UpdateFinished(outcome) => {
                if self.state != WizardState::Updating {
                    warn!("Ignoring update result in {:?}", self.state);
                    return None;
                }
                let token = match outcome {
                    UpdateOutcome::Succeeded => ResumeToken::PostUpdate,
                    UpdateOutcome::Failed => ResumeToken::UpdateRetry,
                };
                match self.stamp.relaunch(token) {
                    Relaunch::Exec(request) => Some(WizardAction::Relaunch(request)),
                    Relaunch::Resume(token) => {
                        self.resume(token);
                        None
                    }
                }
            }
            WizardMessage::ApplyFinished(outcome) => {
                if self.state != WizardState::Applying {
                    warn!("Ignoring apply result in {:?}", self.state);
                    return None;
                }
                match outcome {
                    ApplyOutcome::Applied => {
                        self.set_info("Selected software installed.".to_string());
                        self.enter_state(WizardState::SelectingSoftware);
                    }
                    ApplyOutcome::Failed => self.enter_state(WizardState::ApplyFailed),
                }
                None
            }
        }
    }

    /// Buttons offered by the current screen
    pub fn buttons(&self) -> &'static [Button] {
        state::screen(self.state).buttons
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<WizardAction> {
        if self.message.is_some() {
            self.message = None;
        }

        let screen = state::screen(self.state);
        let result = match screen.kind {
            // Nothing to press while an operation runs
            ScreenKind::Waiting => None,
            ScreenKind::Selection => self.handle_selection_key(key),
            ScreenKind::Text => self.handle_button_key(key),
        };

        self.status_bar = StatusBarState::for_screen(state::screen(self.state).kind);
        result
    }

    fn handle_selection_key(&mut self, key: KeyEvent) -> Option<WizardAction> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.selection.cursor_down(),
            KeyCode::Char('k') | KeyCode::Up => self.selection.cursor_up(),
            KeyCode::Char(' ') => self.selection.toggle_current(),
            KeyCode::Tab | KeyCode::Char(']') => self.selection.next_tab(),
            KeyCode::BackTab | KeyCode::Char('[') => self.selection.prev_tab(),
            _ => return self.handle_button_key(key),
        }
        None
    }

    fn handle_button_key(&mut self, key: KeyEvent) -> Option<WizardAction> {
        let buttons = self.buttons();
        if buttons.is_empty() {
            return None;
        }

        match key.code {
            KeyCode::Char('h') | KeyCode::Left => {
                self.focused_button = self.focused_button.saturating_sub(1);
                None
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.focused_button + 1 < buttons.len() {
                    self.focused_button += 1;
                }
                None
            }
            KeyCode::Enter => {
                let button = buttons[self.focused_button.min(buttons.len() - 1)];
                self.press(button)
            }
            KeyCode::Esc => buttons
                .iter()
                .find(|b| matches!(b, Button::Cancel | Button::No))
                .copied()
                .and_then(|b| self.press(b)),
            KeyCode::Char(c) => buttons
                .iter()
                .find(|b| b.shortcut() == c.to_ascii_lowercase())
                .copied()
                .and_then(|b| self.press(b)),
            _ => None,
        }
    }

    /// Whether the state changed since the last call; the front end raises
    /// its surface when it did.
    pub fn take_attention(&mut self) -> bool {
        std::mem::take(&mut self.attention)
    }

    pub fn set_error(&mut self, text: String) {
        self.message = Some(Message {
            text,
            is_error: true,
        });
    }

    pub fn set_info(&mut self, text: String) {
        self.message = Some(Message {
            text,
            is_error: false,
        });
    }

    pub fn tick(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 4;
    }

    pub fn spinner_char(&self) -> char {
        ['|', '/', '-', '\\'][self.spinner_frame]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::error::Result;
    use futures::future::{self, BoxFuture, FutureExt};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Network always up. Terminal jobs exit with `exit_code` and consume
    /// their files unless `leave_files` is set.
    #[derive(Default)]
    struct CooperativeSystem {
        exit_code: i32,
        leave_files: bool,
        jobs: Mutex<Vec<TerminalJob>>,
        terminal_runs: AtomicUsize,
    }

    impl CooperativeSystem {
        fn exiting_with(exit_code: i32) -> Self {
            Self {
                exit_code,
                ..Default::default()
            }
        }

        fn leaving_files() -> Self {
            Self {
                leave_files: true,
                ..Default::default()
            }
        }
    }

    impl SystemService for CooperativeSystem {
        fn check_reachable(&self, _url: &str) -> BoxFuture<'static, Result<()>> {
            future::ready(Ok(())).boxed()
        }

        fn run_in_terminal(&self, job: TerminalJob) -> BoxFuture<'static, Result<i32>> {
            self.terminal_runs.fetch_add(1, Ordering::SeqCst);
            if !self.leave_files {
                for path in &job.consumes {
                    let _ = std::fs::remove_file(path);
                }
            }
            self.jobs.lock().unwrap().push(job);
            future::ready(Ok(self.exit_code)).boxed()
        }
    }

    struct Fixture {
        wizard: Wizard,
        rx: mpsc::UnboundedReceiver<WizardMessage>,
        system: Arc<CooperativeSystem>,
        _dir: tempfile::TempDir,
    }

    /// A wizard whose group file offers "docker" (checked) and "gimp"
    fn fixture(host: HostContext) -> Fixture {
        fixture_with(host, CooperativeSystem::default())
    }

    fn fixture_with(host: HostContext, system: CooperativeSystem) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let groups = dir.path().join("groups.txt");
        std::fs::write(&groups, "true\ndocker\nContainers\nfalse\ngimp\nImage editor\n").unwrap();
        let exe = dir.path().join("blackbox");
        std::fs::write(&exe, "binary").unwrap();

        let mut config = BlackboxConfig::default();
        config.selection.sources = vec![GroupSourceConfig {
            path: groups,
            label: "Extra".to_string(),
        }];

        let system = Arc::new(system);
        let (wizard, rx) = Wizard::new(
            config,
            host,
            ExecutableStamp::capture(&exe, Vec::new()),
            system.clone(),
        );
        Fixture {
            wizard,
            rx,
            system,
            _dir: dir,
        }
    }

    async fn next_message(fixture: &mut Fixture) -> Option<WizardAction> {
        let msg = fixture.rx.recv().await.unwrap();
        fixture.wizard.handle_message(msg)
    }

    #[tokio::test]
    async fn full_session_reaches_selection_and_applies() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::Fresh);
        assert_eq!(f.wizard.state(), WizardState::Welcome);

        assert_eq!(f.wizard.press(Button::Ok), None);
        assert_eq!(f.wizard.state(), WizardState::CheckingConnectivity);

        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::Updating);

        // Binary unchanged: resumes in-process
        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);
        // No built-in item applies to this host, only the group file
        assert_eq!(f.wizard.selection.groups.len(), 1);

        assert_eq!(f.wizard.press(Button::Ok), None);
        assert_eq!(f.wizard.state(), WizardState::Applying);
        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);

        let jobs = f.system.jobs.lock().unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].command.contains("sudo pacman -Syyu"));
        assert!(jobs[1].command.starts_with("/usr/lib/snigdhaos-blackbox/apply.sh "));
    }

    #[tokio::test]
    async fn nothing_checked_succeeds_without_running_anything() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::PostUpdate);
        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);

        // Uncheck "Containers"
        f.wizard.selection.toggle_current();

        f.wizard.press(Button::Ok);
        assert_eq!(f.wizard.state(), WizardState::Success);
        assert_eq!(f.system.terminal_runs.load(Ordering::SeqCst), 0);

        assert_eq!(f.wizard.press(Button::Ok), Some(WizardAction::Quit));
    }

    #[tokio::test]
    async fn selfupdate_session_skips_to_selection() {
        let mut f = fixture(HostContext {
            selfupdate: true,
            ..Default::default()
        });
        f.wizard.resume(ResumeToken::Fresh);
        f.wizard.press(Button::Ok);

        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);
        assert_eq!(f.system.terminal_runs.load(Ordering::SeqCst), 0);
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn replaced_binary_requests_relaunch() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::UpdateRetry);
        assert_eq!(f.wizard.state(), WizardState::UpdateFailed);

        f.wizard.press(Button::Yes);
        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::Updating);

        let exe = f.wizard.stamp.path().to_path_buf();
        std::fs::File::options()
            .write(true)
            .open(&exe)
            .unwrap()
            .set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(60))
            .unwrap();

        match next_message(&mut f).await {
            Some(WizardAction::Relaunch(request)) => {
                assert_eq!(request.binary_path, exe);
                assert_eq!(request.argument, "POST_UPDATE");
            }
            other => panic!("expected relaunch, got {other:?}"),
        }
        // The old process image keeps its state until it is replaced
        assert_eq!(f.wizard.state(), WizardState::Updating);
    }

    #[tokio::test]
    async fn dryrun_session_runs_to_success() {
        let mut f = fixture(HostContext::default());
        let (wizard, rx) = Wizard::new(
            f.wizard.config.clone(),
            HostContext::default(),
            f.wizard.stamp.clone(),
            Arc::new(service::DryrunService),
        );
        f.wizard = wizard;
        f.rx = rx;

        f.wizard.press(Button::Ok);
        next_message(&mut f).await;
        next_message(&mut f).await;
        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);

        f.wizard.press(Button::Ok);
        next_message(&mut f).await;
        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);
        assert!(f.wizard.message.as_ref().is_some_and(|m| !m.is_error));

        f.wizard.selection.toggle_current();
        f.wizard.press(Button::Ok);
        assert_eq!(f.wizard.state(), WizardState::Success);
        assert_eq!(f.wizard.press(Button::Ok), Some(WizardAction::Quit));
    }

    #[tokio::test]
    async fn failed_update_offers_retry() {
        let mut f = fixture_with(HostContext::default(), CooperativeSystem::exiting_with(1));
        f.wizard.press(Button::Ok);
        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::Updating);

        // Binary unchanged: the failure resumes in-process
        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::UpdateFailed);

        f.wizard.press(Button::Yes);
        assert_eq!(f.wizard.state(), WizardState::CheckingConnectivity);
    }

    #[tokio::test]
    async fn surviving_sentinel_fails_update() {
        let mut f = fixture_with(HostContext::default(), CooperativeSystem::leaving_files());
        f.wizard.resume(ResumeToken::UpdateRetry);
        f.wizard.press(Button::Yes);
        next_message(&mut f).await;
        next_message(&mut f).await;
        assert_eq!(f.wizard.state(), WizardState::UpdateFailed);
    }

    #[tokio::test]
    async fn failed_apply_offers_retry_and_reset() {
        let mut f = fixture_with(HostContext::default(), CooperativeSystem::exiting_with(2));
        f.wizard.resume(ResumeToken::PostUpdate);
        f.wizard.press(Button::Ok);
        assert_eq!(f.wizard.state(), WizardState::Applying);

        assert_eq!(next_message(&mut f).await, None);
        assert_eq!(f.wizard.state(), WizardState::ApplyFailed);

        // Retry runs the script again
        f.wizard.press(Button::Yes);
        assert_eq!(f.wizard.state(), WizardState::Applying);
        next_message(&mut f).await;
        assert_eq!(f.wizard.state(), WizardState::ApplyFailed);
        assert_eq!(f.system.terminal_runs.load(Ordering::SeqCst), 2);

        // Reset goes back to the selection, which keeps its check states
        f.wizard.press(Button::Reset);
        assert_eq!(f.wizard.state(), WizardState::SelectingSoftware);
        assert_eq!(f.wizard.selection.checked_items().count(), 1);
    }

    #[tokio::test]
    async fn package_list_left_behind_fails_apply() {
        let mut f = fixture_with(HostContext::default(), CooperativeSystem::leaving_files());
        f.wizard.resume(ResumeToken::PostUpdate);
        f.wizard.press(Button::Ok);
        next_message(&mut f).await;
        assert_eq!(f.wizard.state(), WizardState::ApplyFailed);
    }

    #[tokio::test]
    async fn quit_confirmation_and_reset() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::Fresh);

        f.wizard.press(Button::Cancel);
        assert_eq!(f.wizard.state(), WizardState::ConfirmQuit);
        f.wizard.press(Button::Reset);
        assert_eq!(f.wizard.state(), WizardState::Welcome);
        f.wizard.press(Button::Cancel);
        assert_eq!(f.wizard.press(Button::Ok), Some(WizardAction::Quit));
    }

    #[tokio::test]
    async fn repeated_entry_does_not_rerun_effects() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::PostUpdate);
        f.wizard.enter_state(WizardState::SelectingSoftware);
        assert_eq!(f.wizard.selection.groups.len(), 1);
        assert!(f.wizard.take_attention());
        f.wizard.enter_state(WizardState::SelectingSoftware);
        assert!(!f.wizard.take_attention());
    }

    #[tokio::test]
    async fn stale_results_are_ignored() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::Fresh);
        let action = f
            .wizard
            .handle_message(WizardMessage::ApplyFinished(ApplyOutcome::Failed));
        assert_eq!(action, None);
        assert_eq!(f.wizard.state(), WizardState::Welcome);
    }

    #[tokio::test]
    async fn keys_only_press_offered_buttons() {
        let mut f = fixture(HostContext::default());
        f.wizard.resume(ResumeToken::Fresh);

        // 'y' is not offered on the welcome screen
        f.wizard.handle_key(KeyEvent::from(KeyCode::Char('y')));
        assert_eq!(f.wizard.state(), WizardState::Welcome);

        f.wizard.handle_key(KeyEvent::from(KeyCode::Enter));
        assert_eq!(f.wizard.state(), WizardState::CheckingConnectivity);

        // Waiting screens ignore keys, even Esc
        f.wizard.handle_key(KeyEvent::from(KeyCode::Esc));
        assert_eq!(f.wizard.state(), WizardState::CheckingConnectivity);
    }
}
