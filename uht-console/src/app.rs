use std::{
    collections::VecDeque,
    io,
    time::{Duration, Instant},
};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{StreamExt, stream::FuturesUnordered};
use ratatui::{Terminal, backend::CrosstermBackend, widgets::TableState};
use tracing::debug;
use uht_admin::prelude::*;

use crate::keys::{KeyAction, map_key};
use crate::ui;

/// Redraw interval while waiting for input or gateway replies
const TICK: Duration = Duration::from_millis(50);

/// Notifications kept on screen at once
const MAX_TOASTS: usize = 3;

/// One line of the object list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRow {
    Object(String),
    /// Caption of the expanded panel with the `Toggle All Fields` action
    FieldsHeader(String),
    Field { object: String, field: String },
    /// Loading or error line of the expanded panel
    FieldsStatus(String),
}

impl ListRow {
    /// Api name of the object the row belongs to
    pub fn object(&self) -> &str {
        match self {
            ListRow::Object(name) | ListRow::FieldsHeader(name) | ListRow::FieldsStatus(name) => {
                name
            }
            ListRow::Field { object, .. } => object,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub expires: Instant,
}

pub struct App<G> {
    pub console: Console<G, NotificationLog>,
    notices: NotificationLog,
    pending: FuturesUnordered<Task>,
    pub toasts: VecDeque<Toast>,
    toast_duration: Duration,
    pub table_state: TableState,
    pub cursor: usize,
    pub show_help: bool,
    pub should_quit: bool,
}

impl<G> App<G>
where
    G: Gateway + 'static,
{
    pub fn new(gateway: G, toast_duration: Duration) -> Self {
        let notices = NotificationLog::new();
        let mut app = Self {
            console: Console::new(gateway, notices.clone()),
            notices,
            pending: FuturesUnordered::new(),
            toasts: VecDeque::new(),
            toast_duration,
            table_state: TableState::default(),
            cursor: 0,
            show_help: false,
            should_quit: false,
        };
        let load = app.console.load();
        app.pending.push(load);
        app
    }

    pub async fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(info);
        }));

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            self.tick(Instant::now());
            terminal.draw(|frame| ui::draw(frame, self))?;

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()?
                    && key.kind == KeyEventKind::Press
                {
                    self.handle_action(map_key(key));
                }
            }
            if self.should_quit {
                return Ok(());
            }

            let outcome = if self.pending.is_empty() {
                tokio::time::sleep(TICK).await;
                None
            } else {
                tokio::select! {
                    outcome = self.pending.next() => outcome,
                    () = tokio::time::sleep(TICK) => None,
                }
            };
            if let Some(outcome) = outcome {
                self.apply(outcome);
            }
        }
    }

    /// Runs every outstanding gateway call, and their follow-ups, to completion.
    pub async fn run_pending(&mut self) {
        while let Some(outcome) = self.pending.next().await {
            self.apply(outcome);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn apply(&mut self, outcome: Outcome) {
        for task in self.console.apply(outcome) {
            self.pending.push(task);
        }
        self.clamp_cursor();
    }

    fn spawn(&mut self, task: Option<Task>) {
        if let Some(task) = task {
            self.pending.push(task);
        }
    }

    /// Moves new notifications onto the screen and drops expired ones.
    pub fn tick(&mut self, now: Instant) {
        for notification in self.notices.drain() {
            self.toasts.push_back(Toast {
                notification,
                expires: now + self.toast_duration,
            });
        }
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
        self.toasts.retain(|toast| toast.expires > now);
    }

    // ------------------------------------------------------------------
    // rows and cursor
    // ------------------------------------------------------------------

    /// Rows of the object list: every object, plus the panel of the expanded one.
    pub fn rows(&self) -> Vec<ListRow> {
        let mut rows = Vec::new();
        for obj in self.console.objects() {
            rows.push(ListRow::Object(obj.api_name.clone()));
            if !obj.is_expanded {
                continue;
            }
            match &obj.fields {
                FieldState::Loaded(fields) => {
                    rows.push(ListRow::FieldsHeader(obj.api_name.clone()));
                    rows.extend(fields.iter().map(|field| ListRow::Field {
                        object: obj.api_name.clone(),
                        field: field.api_name.clone(),
                    }));
                }
                FieldState::NotLoaded | FieldState::Loading | FieldState::Failed { .. } => {
                    rows.push(ListRow::FieldsStatus(obj.api_name.clone()));
                }
            }
        }
        rows
    }

    pub fn current_row(&self) -> Option<ListRow> {
        self.rows().into_iter().nth(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.table_state
            .select(if len == 0 { None } else { Some(self.cursor) });
    }

    fn move_cursor_to_object(&mut self, api_name: &str) {
        if let Some(pos) = self
            .rows()
            .iter()
            .position(|row| matches!(row, ListRow::Object(name) if name == api_name))
        {
            self.cursor = pos;
        }
    }

    // ------------------------------------------------------------------
    // actions
    // ------------------------------------------------------------------

    pub fn handle_action(&mut self, action: KeyAction) {
        if self.show_help {
            match action {
                KeyAction::ToggleHelp | KeyAction::Dismiss => self.show_help = false,
                KeyAction::Quit => {
                    self.show_help = false;
                    self.should_quit = true;
                }
                _ => {}
            }
            return;
        }
        if self.console.is_saving() && action != KeyAction::Quit {
            debug!(?action, "ignored while saving");
            return;
        }
        if self.console.is_loading()
            && matches!(
                action,
                KeyAction::ToggleExpand
                    | KeyAction::ToggleCheck
                    | KeyAction::ToggleAllFields
                    | KeyAction::Save
            )
        {
            debug!(?action, "ignored while loading");
            return;
        }

        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::ToggleHelp => self.show_help = true,
            KeyAction::Dismiss => {
                self.toasts.pop_front();
            }
            KeyAction::MoveDown => {
                self.cursor = self.cursor.saturating_add(1);
            }
            KeyAction::MoveUp => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyAction::JumpFirst => self.cursor = 0,
            KeyAction::JumpLast => self.cursor = usize::MAX,
            KeyAction::ToggleExpand => self.toggle_expand(),
            KeyAction::ToggleCheck => self.toggle_check(),
            KeyAction::ToggleAllFields => {
                if let Some(row) = self.current_row() {
                    self.console.toggle_all_fields(row.object());
                }
            }
            KeyAction::Save => {
                if self.console.save_enabled() {
                    let task = self.console.save();
                    self.spawn(task);
                } else {
                    debug!("save not available");
                }
            }
            KeyAction::Cancel => {
                let task = self.console.cancel();
                self.pending.push(task);
            }
            KeyAction::Noop => {}
        }
        self.clamp_cursor();
    }

    fn toggle_expand(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        let object = row.object().to_string();
        let task = self.console.toggle_expanded(&object);
        self.spawn(task);
        if !matches!(row, ListRow::Object(_)) {
            // collapsing from inside the panel returns to the object
            self.move_cursor_to_object(&object);
        }
    }

    fn toggle_check(&mut self) {
        match self.current_row() {
            Some(ListRow::Object(name)) => {
                let checked = !self.console.object(&name).is_some_and(|o| o.is_selected);
                let task = self.console.toggle_object_selection(&name, checked);
                self.spawn(task);
            }
            Some(ListRow::Field { object, field }) => {
                let checked = !self
                    .console
                    .object(&object)
                    .and_then(|o| o.field(&field))
                    .is_some_and(|f| f.is_selected);
                self.console.toggle_field_selection(&object, &field, checked);
            }
            Some(ListRow::FieldsHeader(object)) => {
                self.console.toggle_all_fields(&object);
            }
            Some(ListRow::FieldsStatus(_)) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uht_admin::mock::{MockGateway, Reply, field, object};

    fn gateway() -> MockGateway {
        MockGateway::new()
            .with_objects(vec![
                object("Account", "Account", true, false),
                object("Contact", "Contact", false, false),
            ])
            .with_fields_for(
                "Account",
                vec![
                    field("Name", "Account Name", FieldType::Text, true),
                    field("Industry", "Industry", FieldType::Picklist, false),
                ],
            )
    }

    async fn loaded_app(gateway: MockGateway) -> App<MockGateway> {
        let mut app = App::new(gateway, Duration::from_secs(5));
        app.run_pending().await;
        app
    }

    #[test_log::test(tokio::test)]
    async fn enter_expands_and_space_toggles_field() {
        let mut app = loaded_app(gateway()).await;
        assert_eq!(app.rows().len(), 2);

        app.handle_action(KeyAction::ToggleExpand);
        app.run_pending().await;
        assert_eq!(
            app.rows(),
            vec![
                ListRow::Object("Account".into()),
                ListRow::FieldsHeader("Account".into()),
                ListRow::Field {
                    object: "Account".into(),
                    field: "Name".into()
                },
                ListRow::Field {
                    object: "Account".into(),
                    field: "Industry".into()
                },
                ListRow::Object("Contact".into()),
            ]
        );

        app.handle_action(KeyAction::JumpFirst);
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::ToggleCheck);
        assert_eq!(
            app.console.delta().fields_to_activate.get("Account"),
            Some(&vec!["Industry".to_string()])
        );

        // collapsing from a field row returns the cursor to the object
        app.handle_action(KeyAction::ToggleExpand);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.rows().len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn space_on_object_auto_expands() {
        let mut app = loaded_app(gateway()).await;
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::ToggleCheck);
        assert_eq!(app.pending_count(), 1);
        assert_eq!(app.rows()[2], ListRow::FieldsStatus("Contact".into()));
        app.run_pending().await;
        assert_eq!(app.console.summary(), "2 of 2");
        assert_eq!(app.console.expanded_object(), Some("Contact"));
    }

    #[test_log::test(tokio::test)]
    async fn save_reloads_and_shows_toast() {
        let gateway = gateway();
        let mut app = loaded_app(gateway.clone()).await;
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::ToggleCheck);
        app.run_pending().await;

        app.handle_action(KeyAction::Save);
        assert!(app.console.is_saving());
        // input is ignored while saving
        app.handle_action(KeyAction::Cancel);
        assert_eq!(app.pending_count(), 1);

        app.run_pending().await;
        assert_eq!(gateway.object_list_count(), 2);
        app.tick(Instant::now());
        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts[0].notification.variant, Variant::Success);
    }

    #[test_log::test(tokio::test)]
    async fn edits_and_save_are_ignored_until_reload_settles() {
        let gateway = gateway();
        let mut app = loaded_app(gateway.clone()).await;
        app.handle_action(KeyAction::MoveDown);
        app.handle_action(KeyAction::ToggleCheck);
        app.run_pending().await;
        assert!(app.console.has_changes());

        app.handle_action(KeyAction::Cancel);
        assert!(app.console.is_loading());
        app.handle_action(KeyAction::Save);
        app.handle_action(KeyAction::JumpFirst);
        app.handle_action(KeyAction::ToggleCheck);
        assert!(!app.console.is_saving());
        assert_eq!(app.pending_count(), 1);
        assert_eq!(app.console.summary(), "2 of 2");

        app.run_pending().await;
        assert!(gateway.saved_deltas().is_empty());
        assert!(!app.console.has_changes());
        assert_eq!(app.console.summary(), "1 of 2");
    }

    #[test_log::test(tokio::test)]
    async fn toasts_expire() {
        let gateway = gateway();
        gateway.reply_objects(Reply::Err("Failed to load objects".into()));
        let mut app = loaded_app(gateway).await;

        let now = Instant::now();
        app.tick(now);
        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts[0].notification.title, "Error loading objects");
        app.tick(now + Duration::from_secs(6));
        assert!(app.toasts.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn help_swallows_keys_until_dismissed() {
        let mut app = loaded_app(gateway()).await;
        app.handle_action(KeyAction::ToggleHelp);
        app.handle_action(KeyAction::MoveDown);
        assert_eq!(app.cursor, 0);
        app.handle_action(KeyAction::Dismiss);
        assert!(!app.show_help);
        app.handle_action(KeyAction::Quit);
        assert!(app.should_quit);
    }
}
