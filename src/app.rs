use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::api::{Agent, AgentId, ApiResult, CockpitClient, FileEntry, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Agents,
    Tasks,
    Files,
    Chat,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Agent,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub input_mode: InputMode,

    // Backend resource lists, replaced wholesale on each fetch
    pub agents: Vec<Agent>,
    pub agent_state: ListState,
    pub tasks: Vec<Task>,
    pub task_state: ListState,
    pub files: Vec<FileEntry>,
    pub file_state: ListState,

    // Chat session
    pub selected_agent: Option<AgentId>,
    pub draft: String,
    pub draft_cursor: usize, // char index into draft
    pub transcript: Vec<ChatMessage>,

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // In-flight requests. Chat is serialized: at most one request at a time,
    // guarded by can_submit(). pending_message holds the text that request
    // carried, so edits made while it is in flight don't change what gets
    // appended to the transcript.
    pub chat_task: Option<JoinHandle<ApiResult<String>>>,
    pub pending_message: Option<String>,
    pub agents_task: Option<JoinHandle<ApiResult<Vec<Agent>>>>,
    pub tasks_task: Option<JoinHandle<ApiResult<Vec<Task>>>>,
    pub files_task: Option<JoinHandle<ApiResult<Vec<FileEntry>>>>,

    // New-task popup
    pub show_task_input: bool,
    pub task_input: String,
    pub task_input_cursor: usize,
    pub create_task_task: Option<JoinHandle<ApiResult<Task>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub agents_area: Option<Rect>,
    pub tasks_area: Option<Rect>,
    pub files_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    pub client: CockpitClient,
}

impl App {
    pub fn new(client: CockpitClient) -> Self {
        Self {
            should_quit: false,
            focus: FocusPane::Agents,
            input_mode: InputMode::Normal,

            agents: Vec::new(),
            agent_state: ListState::default(),
            tasks: Vec::new(),
            task_state: ListState::default(),
            files: Vec::new(),
            file_state: ListState::default(),

            selected_agent: None,
            draft: String::new(),
            draft_cursor: 0,
            transcript: Vec::new(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            chat_task: None,
            pending_message: None,
            agents_task: None,
            tasks_task: None,
            files_task: None,

            show_task_input: false,
            task_input: String::new(),
            task_input_cursor: 0,
            create_task_task: None,

            animation_frame: 0,

            agents_area: None,
            tasks_area: None,
            files_area: None,
            chat_area: None,

            client,
        }
    }

    // Resource fetchers. Each runs on its own task; completions land in
    // whatever order the backend answers and are applied by poll_background.

    pub fn refresh_all(&mut self) {
        self.refresh_agents();
        self.refresh_tasks();
        self.refresh_files();
    }

    pub fn refresh_agents(&mut self) {
        if self.agents_task.is_some() {
            return;
        }
        let client = self.client.clone();
        self.agents_task = Some(tokio::spawn(async move { client.fetch_agents().await }));
    }

    pub fn refresh_tasks(&mut self) {
        if self.tasks_task.is_some() {
            return;
        }
        let client = self.client.clone();
        self.tasks_task = Some(tokio::spawn(async move { client.fetch_tasks().await }));
    }

    pub fn refresh_files(&mut self) {
        if self.files_task.is_some() {
            return;
        }
        let client = self.client.clone();
        self.files_task = Some(tokio::spawn(async move { client.fetch_files().await }));
    }

    /// Apply finished background tasks. Called once per event-loop pass, so
    /// all state mutation stays on the one logical thread.
    pub async fn poll_background(&mut self) {
        if self.agents_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.agents_task.take() {
                match task.await {
                    Ok(Ok(agents)) => self.apply_agents(agents),
                    Ok(Err(err)) => tracing::error!(error = %err, "failed to fetch agents"),
                    Err(err) => tracing::error!(error = %err, "agent fetch task failed"),
                }
            }
        }

        if self.tasks_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.tasks_task.take() {
                match task.await {
                    Ok(Ok(tasks)) => self.apply_tasks(tasks),
                    Ok(Err(err)) => tracing::error!(error = %err, "failed to fetch tasks"),
                    Err(err) => tracing::error!(error = %err, "task fetch task failed"),
                }
            }
        }

        if self.files_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.files_task.take() {
                match task.await {
                    Ok(Ok(files)) => self.apply_files(files),
                    Ok(Err(err)) => tracing::error!(error = %err, "failed to fetch files"),
                    Err(err) => tracing::error!(error = %err, "file fetch task failed"),
                }
            }
        }

        if self.chat_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.chat_task.take() {
                let sent = self.pending_message.take().unwrap_or_default();
                match task.await {
                    Ok(result) => self.apply_chat_result(sent, result),
                    Err(err) => tracing::error!(error = %err, "chat task failed"),
                }
            }
        }

        if self.create_task_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.create_task_task.take() {
                match task.await {
                    Ok(Ok(created)) => self.apply_task_created(created),
                    Ok(Err(err)) => tracing::error!(error = %err, "failed to create task"),
                    Err(err) => tracing::error!(error = %err, "task creation task failed"),
                }
            }
        }
    }

    // List replacement. Wholesale, no merging: the backend owns the data.

    pub fn apply_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
        if self.agents.is_empty() {
            self.agent_state.select(None);
        } else {
            let cursor = self.agent_state.selected().unwrap_or(0);
            self.agent_state.select(Some(cursor.min(self.agents.len() - 1)));
        }
        // selected_agent is a lookup key, not an index; a refresh that drops
        // the id just stops matching a row
    }

    pub fn apply_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        if self.tasks.is_empty() {
            self.task_state.select(None);
        } else {
            let cursor = self.task_state.selected().unwrap_or(0);
            self.task_state.select(Some(cursor.min(self.tasks.len() - 1)));
        }
    }

    pub fn apply_files(&mut self, files: Vec<FileEntry>) {
        self.files = files;
        if self.files.is_empty() {
            self.file_state.select(None);
        } else {
            let cursor = self.file_state.selected().unwrap_or(0);
            self.file_state.select(Some(cursor.min(self.files.len() - 1)));
        }
    }

    // Agent selection

    pub fn select_agent_under_cursor(&mut self) {
        if let Some(i) = self.agent_state.selected() {
            if let Some(agent) = self.agents.get(i) {
                self.selected_agent = Some(agent.id);
            }
        }
    }

    pub fn select_agent_at(&mut self, index: usize) {
        if let Some(agent) = self.agents.get(index) {
            self.agent_state.select(Some(index));
            self.selected_agent = Some(agent.id);
        }
    }

    pub fn selected_agent_name(&self) -> Option<&str> {
        let id = self.selected_agent?;
        self.agents
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }

    // Chat dispatch. Submission is a no-op unless an agent is selected, the
    // draft has non-whitespace content, and nothing is already in flight.

    pub fn can_submit(&self) -> bool {
        self.selected_agent.is_some()
            && !self.draft.trim().is_empty()
            && self.chat_task.is_none()
    }

    pub fn begin_chat(&mut self) {
        if !self.can_submit() {
            return;
        }
        let Some(agent_id) = self.selected_agent else {
            return;
        };
        let message = self.draft.clone();
        let client = self.client.clone();

        self.pending_message = Some(message.clone());
        self.chat_task = Some(tokio::spawn(async move {
            client.send_chat(agent_id, &message).await
        }));
        self.scroll_chat_to_bottom();
    }

    /// On success the exchange lands in the transcript, user entry first,
    /// and the draft clears. On failure nothing changes so the text in the
    /// input box is not lost.
    pub fn apply_chat_result(&mut self, sent: String, result: ApiResult<String>) {
        match result {
            Ok(reply) => {
                self.transcript.push(ChatMessage {
                    role: ChatRole::User,
                    content: sent,
                });
                self.transcript.push(ChatMessage {
                    role: ChatRole::Agent,
                    content: reply,
                });
                self.draft.clear();
                self.draft_cursor = 0;
                self.scroll_chat_to_bottom();
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to send chat message");
            }
        }
    }

    // Task creation popup

    pub fn open_task_input(&mut self) {
        self.show_task_input = true;
        self.task_input.clear();
        self.task_input_cursor = 0;
    }

    pub fn close_task_input(&mut self) {
        self.show_task_input = false;
        self.task_input.clear();
        self.task_input_cursor = 0;
    }

    pub fn begin_create_task(&mut self) {
        if self.task_input.trim().is_empty() || self.create_task_task.is_some() {
            return;
        }
        let name = self.task_input.clone();
        let client = self.client.clone();
        self.create_task_task = Some(tokio::spawn(async move { client.create_task(&name).await }));
    }

    pub fn apply_task_created(&mut self, task: Task) {
        self.tasks.push(task);
        if self.task_state.selected().is_none() {
            self.task_state.select(Some(0));
        }
        self.close_task_input();
    }

    // List navigation for the focused sidebar pane

    pub fn nav_down(&mut self) {
        match self.focus {
            FocusPane::Agents => Self::list_down(&mut self.agent_state, self.agents.len()),
            FocusPane::Tasks => Self::list_down(&mut self.task_state, self.tasks.len()),
            FocusPane::Files => Self::list_down(&mut self.file_state, self.files.len()),
            FocusPane::Chat => self.scroll_down(1),
            FocusPane::Input => {}
        }
    }

    pub fn nav_up(&mut self) {
        match self.focus {
            FocusPane::Agents => Self::list_up(&mut self.agent_state),
            FocusPane::Tasks => Self::list_up(&mut self.task_state),
            FocusPane::Files => Self::list_up(&mut self.file_state),
            FocusPane::Chat => self.scroll_up(1),
            FocusPane::Input => {}
        }
    }

    fn list_down(state: &mut ListState, len: usize) {
        scroll_list_down(state, len);
    }

    fn list_up(state: &mut ListState) {
        scroll_list_up(state);
    }

    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Agents => FocusPane::Tasks,
            FocusPane::Tasks => FocusPane::Files,
            FocusPane::Files => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Input,
            FocusPane::Input => {
                self.input_mode = InputMode::Normal;
                FocusPane::Agents
            }
        };
        if self.focus == FocusPane::Input {
            self.input_mode = InputMode::Editing;
            self.draft_cursor = self.draft.chars().count();
        }
    }

    pub fn focus_input(&mut self) {
        self.focus = FocusPane::Input;
        self.input_mode = InputMode::Editing;
        self.draft_cursor = self.draft.chars().count();
    }

    // Chat scrolling

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.transcript_line_count().saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down(self.chat_height / 2);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up(self.chat_height / 2);
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total = self.transcript_line_count();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_scroll = total.saturating_sub(visible);
    }

    /// Rendered line count of the transcript at the current chat width,
    /// including the in-flight indicator, for scroll clamping.
    pub fn transcript_line_count(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;
        for msg in &self.transcript {
            total += 1; // role line
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content
                let chars = line.chars().count();
                if chars == 0 {
                    total += 1;
                } else {
                    total += ((chars / wrap_width) + 1) as u16;
                }
            }
            total += 1; // blank line after message
        }

        if self.chat_task.is_some() {
            total += 2; // role line + "Thinking..."
        }

        total
    }

    /// Tick animation frame (driven by the Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat_task.is_some() || self.create_task_task.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

pub(crate) fn scroll_list_down(state: &mut ListState, len: usize) {
    if len > 0 {
        let i = state.selected().unwrap_or(0);
        state.select(Some((i + 1).min(len - 1)));
    }
}

pub(crate) fn scroll_list_up(state: &mut ListState) {
    let i = state.selected().unwrap_or(0);
    state.select(Some(i.saturating_sub(1)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;

    fn test_app() -> App {
        App::new(CockpitClient::new("http://localhost:5000"))
    }

    fn agent(id: AgentId, name: &str) -> Agent {
        Agent {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_fetch_replaces_agent_list_exactly() {
        let mut app = test_app();
        app.apply_agents(vec![agent(9, "Old"), agent(10, "Stale")]);

        app.apply_agents(vec![agent(1, "A")]);

        assert_eq!(app.agents.len(), 1);
        assert_eq!(app.agents[0].name, "A");
    }

    #[test]
    fn test_list_cursor_clamps_after_shrinking_refresh() {
        let mut app = test_app();
        app.apply_agents(vec![agent(1, "A"), agent(2, "B"), agent(3, "C")]);
        app.agent_state.select(Some(2));

        app.apply_agents(vec![agent(1, "A")]);

        assert_eq!(app.agent_state.selected(), Some(0));
    }

    #[test]
    fn test_submit_is_noop_without_selected_agent() {
        let mut app = test_app();
        app.draft = "hello".to_string();

        assert!(!app.can_submit());
        app.begin_chat();

        assert!(app.chat_task.is_none());
        assert!(app.transcript.is_empty());
        assert_eq!(app.draft, "hello");
    }

    #[test]
    fn test_submit_is_noop_with_whitespace_draft() {
        let mut app = test_app();
        app.apply_agents(vec![agent(1, "A")]);
        app.selected_agent = Some(1);
        app.draft = "   \t".to_string();

        assert!(!app.can_submit());
        app.begin_chat();

        assert!(app.chat_task.is_none());
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn test_chat_success_appends_exchange_and_clears_draft() {
        let mut app = test_app();
        app.selected_agent = Some(1);
        app.draft = "hello".to_string();

        app.apply_chat_result("hello".to_string(), Ok("hi there".to_string()));

        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.transcript[0].role, ChatRole::User);
        assert_eq!(app.transcript[0].content, "hello");
        assert_eq!(app.transcript[1].role, ChatRole::Agent);
        assert_eq!(app.transcript[1].content, "hi there");
        assert!(app.draft.is_empty());
        assert_eq!(app.draft_cursor, 0);
    }

    #[test]
    fn test_chat_failure_preserves_draft_and_transcript() {
        let mut app = test_app();
        app.selected_agent = Some(1);
        app.draft = "hello".to_string();
        app.transcript.push(ChatMessage {
            role: ChatRole::User,
            content: "earlier".to_string(),
        });

        app.apply_chat_result(
            "hello".to_string(),
            Err(ApiError::Status {
                endpoint: "/api/chat",
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            }),
        );

        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.draft, "hello");
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_noop() {
        let mut app = test_app();
        app.apply_agents(vec![agent(1, "A")]);
        app.selected_agent = Some(1);
        app.draft = "first".to_string();

        app.begin_chat();
        assert!(app.chat_task.is_some());
        assert_eq!(app.pending_message.as_deref(), Some("first"));

        app.draft = "second".to_string();
        assert!(!app.can_submit());
        app.begin_chat();

        assert_eq!(app.pending_message.as_deref(), Some("first"));

        if let Some(task) = app.chat_task.take() {
            task.abort();
        }
    }

    #[test]
    fn test_switching_agent_preserves_transcript() {
        let mut app = test_app();
        app.apply_agents(vec![agent(1, "A"), agent(2, "B")]);
        app.select_agent_at(0);
        app.transcript.push(ChatMessage {
            role: ChatRole::User,
            content: "hello".to_string(),
        });
        app.transcript.push(ChatMessage {
            role: ChatRole::Agent,
            content: "hi".to_string(),
        });

        app.select_agent_at(1);

        assert_eq!(app.selected_agent, Some(2));
        assert_eq!(app.transcript.len(), 2);
    }

    #[test]
    fn test_selected_agent_survives_refresh_that_drops_it() {
        let mut app = test_app();
        app.apply_agents(vec![agent(1, "A"), agent(2, "B")]);
        app.select_agent_at(1);

        app.apply_agents(vec![agent(1, "A")]);

        assert_eq!(app.selected_agent, Some(2));
        assert!(app.selected_agent_name().is_none());
    }

    #[test]
    fn test_task_created_appends_to_list() {
        let mut app = test_app();
        app.apply_tasks(vec![Task {
            id: 1,
            name: "Code Review".to_string(),
            status: "running".to_string(),
        }]);

        app.show_task_input = true;
        app.task_input = "Deploy".to_string();
        app.apply_task_created(Task {
            id: 3,
            name: "Deploy".to_string(),
            status: "created".to_string(),
        });

        assert_eq!(app.tasks.len(), 2);
        assert_eq!(app.tasks[1].name, "Deploy");
        assert!(!app.show_task_input);
        assert!(app.task_input.is_empty());
    }

    #[test]
    fn test_focus_cycle_enters_editing_on_input() {
        let mut app = test_app();
        assert_eq!(app.focus, FocusPane::Agents);

        app.next_focus();
        app.next_focus();
        app.next_focus();
        assert_eq!(app.focus, FocusPane::Chat);

        app.next_focus();
        assert_eq!(app.focus, FocusPane::Input);
        assert_eq!(app.input_mode, InputMode::Editing);

        app.next_focus();
        assert_eq!(app.focus, FocusPane::Agents);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_startup_fetch_and_chat_round_trip() {
        use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/agents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "agents": [{"id": 1, "name": "Assistant"}]
            })))
            .mount(&server)
            .await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tasks": [{"id": 1, "name": "Code Review", "status": "running"}]
            })))
            .mount(&server)
            .await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/api/filesystem"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [{"name": "main.py", "type": "file"}]
            })))
            .mount(&server)
            .await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "hi there"
            })))
            .mount(&server)
            .await;

        let mut app = App::new(CockpitClient::new(&server.uri()));
        app.refresh_all();

        for _ in 0..200 {
            app.poll_background().await;
            if !app.agents.is_empty() && !app.tasks.is_empty() && !app.files.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(app.agents.len(), 1);
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.files.len(), 1);

        app.select_agent_at(0);
        app.draft = "hello".to_string();
        app.begin_chat();
        assert!(app.chat_task.is_some());

        for _ in 0..200 {
            app.poll_background().await;
            if app.chat_task.is_none() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.transcript[0].content, "hello");
        assert_eq!(app.transcript[1].content, "hi there");
        assert!(app.draft.is_empty());
    }

    #[test]
    fn test_transcript_line_count_wraps_long_lines() {
        let mut app = test_app();
        app.chat_width = 10;
        app.transcript.push(ChatMessage {
            role: ChatRole::User,
            content: "a".repeat(25),
        });

        // role line + 3 wrapped lines + trailing blank
        assert_eq!(app.transcript_line_count(), 5);
    }
}
