use crate::dashboard::{DashboardState, DraftField};
use crate::orchestrator::UiCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Experiments,
    Compose,
    Run,
    Help,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Experiments, Tab::Compose, Tab::Run, Tab::Help];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Experiments => "Experiments",
            Tab::Compose => "Compose",
            Tab::Run => "Run",
            Tab::Help => "Help",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn shifted(self, by: isize) -> Tab {
        let n = Self::ALL.len() as isize;
        let idx = (self.index() as isize + by).rem_euclid(n);
        Self::ALL[idx as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchField {
    Seed,
    Threshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Draft(DraftField),
    Launch(LaunchField),
}

/// Text being typed into a field; committed on Enter, dropped on Esc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub target: EditTarget,
    pub text: String,
}

/// What the event loop should do after a key press.
#[derive(Debug)]
pub enum KeyOutcome {
    Commands(Vec<UiCommand>),
    ExportRun,
    CopyCorrelationId,
    Quit,
}

impl KeyOutcome {
    fn none() -> Self {
        KeyOutcome::Commands(Vec::new())
    }
}

/// Terminal-only state layered over the dashboard container. Owned by the UI thread.
pub struct UiState {
    pub dash: DashboardState,
    pub tab: Tab,
    pub base_url: String,
    pub compose_cursor: usize,
    pub editing: Option<EditBuffer>,
}

impl UiState {
    pub fn new(base_url: String) -> Self {
        Self {
            dash: DashboardState::default(),
            tab: Tab::Experiments,
            base_url,
            compose_cursor: 0,
            editing: None,
        }
    }

    pub fn focused_draft_field(&self) -> Option<DraftField> {
        self.dash.composer.fields().get(self.compose_cursor).copied()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if self.editing.is_some() {
            self.handle_edit_key(key.code);
            return KeyOutcome::none();
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
                return KeyOutcome::Quit;
            }
            (_, KeyCode::Tab) => {
                self.tab = self.tab.shifted(1);
                return KeyOutcome::none();
            }
            (_, KeyCode::BackTab) => {
                self.tab = self.tab.shifted(-1);
                return KeyOutcome::none();
            }
            (_, KeyCode::Char('?')) => {
                self.tab = Tab::Help;
                return KeyOutcome::none();
            }
            (_, KeyCode::Char('R')) => {
                self.dash.set_info("Refreshing experiments…");
                return KeyOutcome::Commands(self.dash.refresh());
            }
            (_, KeyCode::Char('x')) => {
                self.dash.dismiss_error();
                return KeyOutcome::none();
            }
            _ => {}
        }

        match self.tab {
            Tab::Experiments => self.handle_experiments_key(key.code),
            Tab::Compose => self.handle_compose_key(key.code),
            Tab::Run => self.handle_run_key(key.code),
            Tab::Help => KeyOutcome::none(),
        }
    }

    fn handle_experiments_key(&mut self, code: KeyCode) -> KeyOutcome {
        match code {
            KeyCode::Up | KeyCode::Char('k') => KeyOutcome::Commands(self.dash.select_relative(-1)),
            KeyCode::Down | KeyCode::Char('j') => {
                KeyOutcome::Commands(self.dash.select_relative(1))
            }
            KeyCode::Char('S') => {
                self.begin_edit(EditTarget::Launch(LaunchField::Seed));
                KeyOutcome::none()
            }
            KeyCode::Char('T') => {
                self.begin_edit(EditTarget::Launch(LaunchField::Threshold));
                KeyOutcome::none()
            }
            KeyCode::Char('l') | KeyCode::Enter => {
                let cmds = self.dash.launch();
                if !cmds.is_empty() {
                    self.tab = Tab::Run;
                }
                KeyOutcome::Commands(cmds)
            }
            _ => KeyOutcome::none(),
        }
    }

    fn handle_compose_key(&mut self, code: KeyCode) -> KeyOutcome {
        let field_count = self.dash.composer.fields().len();
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.compose_cursor = self.compose_cursor.saturating_sub(1);
                KeyOutcome::none()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.compose_cursor = (self.compose_cursor + 1).min(field_count.saturating_sub(1));
                KeyOutcome::none()
            }
            KeyCode::Enter => {
                if let Some(field) = self.focused_draft_field() {
                    if field.is_selector() {
                        self.dash.composer.cycle(field);
                    } else {
                        self.begin_edit(EditTarget::Draft(field));
                    }
                }
                KeyOutcome::none()
            }
            KeyCode::Char('c') => KeyOutcome::Commands(self.dash.submit_draft()),
            _ => KeyOutcome::none(),
        }
    }

    fn handle_run_key(&mut self, code: KeyCode) -> KeyOutcome {
        let total = self
            .dash
            .run
            .committed()
            .map(|b| b.attempts.len())
            .unwrap_or(0);
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.dash.run.feed_scroll = self.dash.run.feed_scroll.saturating_sub(1);
                KeyOutcome::none()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.dash.run.feed_scroll =
                    (self.dash.run.feed_scroll + 1).min(total.saturating_sub(1));
                KeyOutcome::none()
            }
            KeyCode::Char('e') => KeyOutcome::ExportRun,
            KeyCode::Char('y') => KeyOutcome::CopyCorrelationId,
            _ => KeyOutcome::none(),
        }
    }

    fn begin_edit(&mut self, target: EditTarget) {
        let text = match target {
            EditTarget::Draft(field) => self.dash.composer.value(field),
            EditTarget::Launch(LaunchField::Seed) => self.dash.launch.seed.clone(),
            EditTarget::Launch(LaunchField::Threshold) => {
                self.dash.launch.failure_threshold.clone()
            }
        };
        self.editing = Some(EditBuffer { target, text });
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(buf) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) => buf.text.push(c),
            KeyCode::Backspace => {
                buf.text.pop();
            }
            KeyCode::Esc => self.editing = None,
            KeyCode::Enter => {
                if let Some(buf) = self.editing.take() {
                    self.commit_edit(buf);
                }
            }
            _ => {}
        }
    }

    fn commit_edit(&mut self, buf: EditBuffer) {
        match buf.target {
            EditTarget::Draft(field) => {
                self.dash.composer.set_text(field, buf.text);
            }
            EditTarget::Launch(LaunchField::Seed) => self.dash.launch.seed = buf.text,
            EditTarget::Launch(LaunchField::Threshold) => {
                self.dash.launch.failure_threshold = buf.text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppEvent;
    use crate::test_support::experiment;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut UiState, text: &str) {
        for c in text.chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_tab_cycles_and_wraps() {
        let mut state = UiState::new("http://api".into());
        state.handle_key(key(KeyCode::BackTab));
        assert_eq!(state.tab, Tab::Help);
        state.handle_key(key(KeyCode::Tab));
        assert_eq!(state.tab, Tab::Experiments);
    }

    #[test]
    fn test_editing_captures_quit_key() {
        let mut state = UiState::new("http://api".into());
        state.tab = Tab::Compose;
        state.handle_key(key(KeyCode::Enter));
        assert!(state.editing.is_some());
        // Clear the current name, then type a new one containing 'q'.
        for _ in 0..state.dash.composer.name.len() {
            state.handle_key(key(KeyCode::Backspace));
        }
        type_text(&mut state, "quality sweep");
        assert!(matches!(
            state.handle_key(key(KeyCode::Enter)),
            KeyOutcome::Commands(c) if c.is_empty()
        ));
        assert_eq!(state.dash.composer.name, "quality sweep");
    }

    #[test]
    fn test_escape_discards_edit() {
        let mut state = UiState::new("http://api".into());
        state.handle_key(key(KeyCode::Char('T')));
        type_text(&mut state, "9");
        state.handle_key(key(KeyCode::Esc));
        assert!(state.editing.is_none());
        assert_eq!(state.dash.launch.failure_threshold, "0.5");
    }

    #[test]
    fn test_selector_fields_cycle_on_enter() {
        let mut state = UiState::new("http://api".into());
        state.tab = Tab::Compose;
        state.handle_key(key(KeyCode::Down));
        assert_eq!(state.focused_draft_field(), Some(DraftField::Workload));
        state.handle_key(key(KeyCode::Enter));
        assert!(state.editing.is_none());
        assert_eq!(state.dash.composer.dataset_ref, "ci_triage/v1.jsonl");
    }

    #[test]
    fn test_launch_key_switches_to_run_tab() {
        let mut state = UiState::new("http://api".into());
        let cmds = state
            .dash
            .apply(AppEvent::ExperimentsLoaded(Ok(vec![experiment("exp-1", "One")])));
        let Some(UiCommand::LoadExperiment { id, generation }) = cmds.into_iter().next() else {
            panic!("expected detail load");
        };
        state.dash.apply(AppEvent::ExperimentLoaded {
            id,
            generation,
            result: Ok(experiment("exp-1", "One")),
        });

        state.handle_key(key(KeyCode::Char('S')));
        type_text(&mut state, "0");
        state.handle_key(key(KeyCode::Enter));
        assert_eq!(state.dash.launch.seed, "420");

        match state.handle_key(key(KeyCode::Char('l'))) {
            KeyOutcome::Commands(cmds) => match cmds.as_slice() {
                [UiCommand::LaunchRun { request, .. }] => assert_eq!(request.seed, Some(420)),
                other => panic!("unexpected commands {other:?}"),
            },
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(state.tab, Tab::Run);
    }

    #[test]
    fn test_refresh_note_cleared_when_list_arrives() {
        let mut state = UiState::new("http://api".into());
        match state.handle_key(key(KeyCode::Char('R'))) {
            KeyOutcome::Commands(cmds) => {
                assert!(matches!(cmds.as_slice(), [UiCommand::RefreshExperiments]))
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(state.dash.info(), Some("Refreshing experiments…"));
        state
            .dash
            .apply(AppEvent::ExperimentsLoaded(Ok(vec![experiment("exp-1", "One")])));
        assert_eq!(state.dash.info(), None);
    }

    #[test]
    fn test_run_tab_actions() {
        let mut state = UiState::new("http://api".into());
        state.tab = Tab::Run;
        assert!(matches!(
            state.handle_key(key(KeyCode::Char('e'))),
            KeyOutcome::ExportRun
        ));
        assert!(matches!(
            state.handle_key(key(KeyCode::Char('y'))),
            KeyOutcome::CopyCorrelationId
        ));
        state.handle_key(key(KeyCode::Down));
        assert_eq!(state.dash.run.feed_scroll, 0);
        assert!(matches!(
            state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        ));
    }
}
