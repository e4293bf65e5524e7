use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global quit works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // The new-task popup grabs all input while open
    if app.show_task_input {
        handle_task_input_key(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab => app.next_focus(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('g') => {
            if app.focus == FocusPane::Chat {
                app.chat_scroll = 0;
            }
        }
        KeyCode::Char('G') => {
            if app.focus == FocusPane::Chat {
                app.scroll_chat_to_bottom();
            }
        }

        // Half-page chat scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }

        // Enter picks the agent under the cursor; on the input box it
        // starts editing instead
        KeyCode::Enter => match app.focus {
            FocusPane::Agents => app.select_agent_under_cursor(),
            FocusPane::Input => app.focus_input(),
            _ => {}
        },

        // Jump straight to the message input
        KeyCode::Char('i') | KeyCode::Char('/') => app.focus_input(),

        // Re-fetch all three backend lists
        KeyCode::Char('r') => app.refresh_all(),

        // New task popup
        KeyCode::Char('n') => app.open_task_input(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // No-op unless an agent is selected, the draft has content, and
            // no send is already in flight
            app.begin_chat();
        }
        KeyCode::Backspace => {
            if app.draft_cursor > 0 {
                app.draft_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.draft, app.draft_cursor);
                app.draft.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.draft.chars().count();
            if app.draft_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.draft, app.draft_cursor);
                app.draft.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.draft_cursor = app.draft_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.draft.chars().count();
            app.draft_cursor = (app.draft_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.draft_cursor = 0;
        }
        KeyCode::End => {
            app.draft_cursor = app.draft.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.draft, app.draft_cursor);
            app.draft.insert(byte_pos, c);
            app.draft_cursor += 1;
        }
        _ => {}
    }
}

fn handle_task_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_task_input(),
        KeyCode::Enter => app.begin_create_task(),
        KeyCode::Backspace => {
            if app.task_input_cursor > 0 {
                app.task_input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.task_input, app.task_input_cursor);
                app.task_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.task_input_cursor = app.task_input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.task_input.chars().count();
            app.task_input_cursor = (app.task_input_cursor + 1).min(char_count);
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.task_input, app.task_input_cursor);
            app.task_input.insert(byte_pos, c);
            app.task_input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Row index inside a bordered list block, offset-adjusted by the caller
fn clicked_row(area: Rect, y: u16) -> Option<usize> {
    let inner_top = area.y + 1;
    let inner_bottom = area.y + area.height.saturating_sub(1);
    if y >= inner_top && y < inner_bottom {
        Some((y - inner_top) as usize)
    } else {
        None
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_agents = app.agents_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_tasks = app.tasks_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_files = app.files_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.show_task_input {
                return;
            }
            if in_agents {
                app.focus = FocusPane::Agents;
                if let Some(area) = app.agents_area {
                    if let Some(row) = clicked_row(area, y) {
                        let index = app.agent_state.offset() + row;
                        // Click both moves the cursor and selects the agent
                        app.select_agent_at(index);
                    }
                }
            } else if in_tasks {
                app.focus = FocusPane::Tasks;
            } else if in_files {
                app.focus = FocusPane::Files;
            } else if in_chat {
                app.focus = FocusPane::Chat;
            }
        }
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_down(3);
            } else if in_agents {
                crate::app::scroll_list_down(&mut app.agent_state, app.agents.len());
            } else if in_tasks {
                crate::app::scroll_list_down(&mut app.task_state, app.tasks.len());
            } else if in_files {
                crate::app::scroll_list_down(&mut app.file_state, app.files.len());
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_up(3);
            } else if in_agents {
                crate::app::scroll_list_up(&mut app.agent_state);
            } else if in_tasks {
                crate::app::scroll_list_up(&mut app.task_state);
            } else if in_files {
                crate::app::scroll_list_up(&mut app.file_state);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Agent, CockpitClient};

    fn test_app() -> App {
        App::new(CockpitClient::new("http://localhost:5000"))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_q_quits_in_normal_mode() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_q_types_into_draft_in_editing_mode() {
        let mut app = test_app();
        app.focus_input();

        handle_key(&mut app, press(KeyCode::Char('q'))).unwrap();

        assert!(!app.should_quit);
        assert_eq!(app.draft, "q");
    }

    #[test]
    fn test_enter_on_agents_selects_under_cursor() {
        let mut app = test_app();
        app.apply_agents(vec![
            Agent {
                id: 1,
                name: "Assistant".to_string(),
            },
            Agent {
                id: 2,
                name: "Coder".to_string(),
            },
        ]);
        app.agent_state.select(Some(1));

        handle_key(&mut app, press(KeyCode::Enter)).unwrap();

        assert_eq!(app.selected_agent, Some(2));
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let mut app = test_app();
        app.focus_input();

        for c in "héllo".chars() {
            handle_key(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        handle_key(&mut app, press(KeyCode::Left)).unwrap();
        handle_key(&mut app, press(KeyCode::Left)).unwrap();
        handle_key(&mut app, press(KeyCode::Backspace)).unwrap();

        assert_eq!(app.draft, "hélo");
        assert_eq!(app.draft_cursor, 2);
    }

    #[test]
    fn test_esc_leaves_editing_mode() {
        let mut app = test_app();
        app.focus_input();
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_key(&mut app, press(KeyCode::Esc)).unwrap();

        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_task_popup_grabs_keys() {
        let mut app = test_app();
        app.open_task_input();

        handle_key(&mut app, press(KeyCode::Char('q'))).unwrap();

        assert!(!app.should_quit);
        assert_eq!(app.task_input, "q");
    }

    #[test]
    fn test_click_in_agents_list_selects_row() {
        let mut app = test_app();
        app.apply_agents(vec![
            Agent {
                id: 1,
                name: "Assistant".to_string(),
            },
            Agent {
                id: 2,
                name: "Coder".to_string(),
            },
        ]);
        app.agents_area = Some(Rect::new(0, 1, 30, 6));

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 3, // second row inside the border
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, click);

        assert_eq!(app.focus, FocusPane::Agents);
        assert_eq!(app.selected_agent, Some(2));
    }
}
