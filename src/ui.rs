use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};

use crate::app::{App, ChatRole, FocusPane, InputMode};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_body(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if app.show_task_input {
        render_task_input(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let selection = match app.selected_agent_name() {
        Some(name) => format!(" [{}]", name),
        None => String::new(),
    };

    let title = Line::from(vec![
        Span::styled(" agentdeck ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(selection, Style::default().fg(Color::Green)),
        Span::raw(" "),
        Span::styled(
            app.client.base_url().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_body(app: &mut App, frame: &mut Frame, area: Rect) {
    // Sidebar with the three backend lists, chat on the right
    let [sidebar_area, chat_column] =
        Layout::horizontal([Constraint::Length(32), Constraint::Min(0)]).areas(area);

    let [agents_area, tasks_area, files_area] = Layout::vertical([
        Constraint::Percentage(34),
        Constraint::Percentage(33),
        Constraint::Percentage(33),
    ])
    .areas(sidebar_area);

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(chat_column);

    // Store areas for mouse hit-testing
    app.agents_area = Some(agents_area);
    app.tasks_area = Some(tasks_area);
    app.files_area = Some(files_area);
    app.chat_area = Some(chat_area);

    render_agents(app, frame, agents_area);
    render_tasks(app, frame, tasks_area);
    render_files(app, frame, files_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
}

fn border_color(focused: bool) -> Color {
    if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    }
}

fn render_agents(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app.focus == FocusPane::Agents)))
        .title(format!(" Agents ({}) ", app.agents.len()));

    if app.agents.is_empty() {
        let placeholder = Paragraph::new("No agents")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .agents
        .iter()
        .map(|agent| {
            let is_selected = app.selected_agent == Some(agent.id);
            let marker = if is_selected { "* " } else { "  " };
            let style = if is_selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", marker, agent.name)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.agent_state);
}

fn status_style(status: &str) -> Style {
    match status {
        "running" => Style::default().fg(Color::Yellow),
        "completed" => Style::default().fg(Color::Green),
        "created" => Style::default().fg(Color::Cyan),
        "failed" | "error" => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    }
}

fn render_tasks(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app.focus == FocusPane::Tasks)))
        .title(format!(" Tasks ({}) ", app.tasks.len()));

    if app.tasks.is_empty() {
        let placeholder = Paragraph::new("No tasks.\nPress 'n' to create one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .tasks
        .iter()
        .map(|task| {
            ListItem::new(Line::from(vec![
                Span::raw(format!(" {} ", task.name)),
                Span::styled(task.status.clone(), status_style(&task.status)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.task_state);
}

fn render_files(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app.focus == FocusPane::Files)))
        .title(format!(" Files ({}) ", app.files.len()));

    if app.files.is_empty() {
        let placeholder = Paragraph::new("No files")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .files
        .iter()
        .map(|file| {
            let name_style = if file.kind == "directory" {
                Style::default().fg(Color::Blue).bold()
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", file.name), name_style),
                Span::styled(format!("({})", file.kind), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.file_state);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let title = match app.selected_agent_name() {
        Some(name) => format!(" Chat with {} ", name),
        None => " Chat ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(app.focus == FocusPane::Chat)))
        .title(title);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_text = if app.transcript.is_empty() && app.chat_task.is_none() {
        let hint = if app.selected_agent.is_some() {
            "Type a message and press Enter..."
        } else {
            "Select an agent to start chatting..."
        };
        Text::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in &app.transcript {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                }
                ChatRole::Agent => {
                    lines.push(Line::from(Span::styled(
                        "Agent:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                }
            }
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if app.chat_task.is_some() {
            lines.push(Line::from(Span::styled(
                "Agent:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);

    let total_lines = app.transcript_line_count();
    if total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &mut App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing && !app.show_task_input;
    let input_border = if app.focus == FocusPane::Input || editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let title = if app.selected_agent.is_some() {
        " Message (i to edit, Enter to send) "
    } else {
        " Message (select an agent first) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border))
        .title(title);

    // Horizontal scroll keeps the cursor visible in a long draft
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.draft_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Dark key caps with bright text, readable on light and dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.show_task_input {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" create ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else if app.input_mode == InputMode::Editing {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ]
    } else {
        let mut hints = vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" focus ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
        ];

        if app.focus == FocusPane::Agents {
            hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" select ", label_style),
            ]);
        }

        hints.extend(vec![
            Span::styled(" i ", key_style),
            Span::styled(" message ", label_style),
            Span::styled(" n ", key_style),
            Span::styled(" new task ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" refresh ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
        hints
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_task_input(app: &App, frame: &mut Frame, area: Rect) {
    // Centered popup over the whole screen
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" New Task ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Task name. Enter to create, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let input = Paragraph::new(app.task_input.as_str()).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    let cursor_x = app.task_input_cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}
