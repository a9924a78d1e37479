use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use pulsecfg_core::view::{InputField, Widget};
use pulsecfg_core::{Confirmation, Editor, EditorConfig, NoticeLevel, Scope, Section, ViewNode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Terminal;
use tracing::warn;

use crate::exporter;

const HELP: &str = "←/→ tabs  ↑/↓ scroll  a add  g graph  e example  w write  x dismiss  R reset  q quit";

struct ViewerState {
    editor: Editor,
    output: Option<PathBuf>,
    keep_backups: usize,
    scroll: u16,
    show_graph: bool,
    confirm_reset: bool,
}

impl ViewerState {
    fn new(editor: Editor, output: Option<PathBuf>, keep_backups: usize) -> Self {
        Self {
            editor,
            output,
            keep_backups,
            scroll: 0,
            show_graph: false,
            confirm_reset: false,
        }
    }

    fn select(&mut self, section: Section) {
        self.editor.select_tab(section);
        self.scroll = 0;
    }

    fn add_entity(&mut self) {
        let action = match self.editor.current_view() {
            Some(ViewNode::Section { add: Some(action), .. }) => action.clone(),
            _ => return,
        };
        if let Err(err) = self.editor.dispatch(action) {
            self.editor.notices_mut().push_error(err.to_string());
        }
    }

    fn write(&mut self) {
        let export = match self.editor.export() {
            Ok(export) => export,
            Err(err) => {
                self.editor.notices_mut().push_error(err.to_string());
                return;
            }
        };
        let target = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&export.file_name));
        if let Err(err) = exporter::write_export(&target, &export.contents, Utc::now(), self.keep_backups) {
            warn!(error = %err, "export write failed");
            self.editor.notices_mut().push_error(format!("Export failed: {err}"));
        }
    }
}

pub async fn run_viewer(
    config: EditorConfig,
    initial: Option<String>,
    output: Option<PathBuf>,
    keep_backups: usize,
) -> Result<()> {
    let mut editor = Editor::new(config);
    if let Some(text) = initial {
        editor.import(&text)?;
    }
    let mut state = ViewerState::new(editor, output, keep_backups);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = async {
        loop {
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if state.confirm_reset {
                        let answer = if key.code == KeyCode::Char('y') {
                            Confirmation::Confirmed
                        } else {
                            Confirmation::Declined
                        };
                        state.editor.reset(answer);
                        state.confirm_reset = false;
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Right | KeyCode::Tab => {
                            let next = state.editor.tab().next();
                            state.select(next);
                        }
                        KeyCode::Left | KeyCode::BackTab => {
                            let prev = state.editor.tab().prev();
                            state.select(prev);
                        }
                        KeyCode::Down => state.scroll = state.scroll.saturating_add(1),
                        KeyCode::Up => state.scroll = state.scroll.saturating_sub(1),
                        KeyCode::Char('a') => state.add_entity(),
                        KeyCode::Char('g') => state.show_graph = !state.show_graph,
                        KeyCode::Char('e') => {
                            if let Err(err) = state.editor.load_example() {
                                state.editor.notices_mut().push_error(err.to_string());
                            }
                        }
                        KeyCode::Char('w') => state.write(),
                        KeyCode::Char('x') => {
                            state.editor.notices_mut().dismiss();
                        }
                        KeyCode::Char('R') => state.confirm_reset = true,
                        _ => {}
                    }
                }
            }

            state.editor.prune_notices(Utc::now());
            let graph = if state.show_graph {
                Some(state.editor.graph(Scope::All).to_dot())
            } else {
                None
            };
            terminal.draw(|frame| draw_ui(frame.size(), frame, &state, graph.as_deref()))?;
        }

        Ok::<(), anyhow::Error>(())
    }
    .await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

fn draw_ui(area: Rect, frame: &mut ratatui::Frame<'_>, state: &ViewerState, graph: Option<&str>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    frame.render_widget(render_tabs(state), rows[0]);

    let body = match graph {
        Some(_) => Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]),
        None => Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(rows[1]),
    };

    let outline = state
        .editor
        .current_view()
        .map(outline_lines)
        .unwrap_or_default();
    let outline = Paragraph::new(outline)
        .block(Block::default().borders(Borders::ALL).title(state.editor.tab().title()))
        .scroll((state.scroll, 0));
    frame.render_widget(outline, body[0]);

    if let Some(dot) = graph {
        let graph = Paragraph::new(dot.to_string())
            .block(Block::default().borders(Borders::ALL).title("References"))
            .wrap(Wrap { trim: false });
        frame.render_widget(graph, body[1]);
    }

    frame.render_widget(render_footer(state), rows[2]);
}

fn render_tabs(state: &ViewerState) -> Tabs<'static> {
    let counts = state.editor.badges();
    let titles: Vec<Line> = Section::ALL
        .iter()
        .map(|section| match counts.of(*section) {
            Some(count) => Line::from(format!("{} ({count})", section.title())),
            None => Line::from(section.title()),
        })
        .collect();
    let selected = Section::ALL
        .iter()
        .position(|s| *s == state.editor.tab())
        .unwrap_or(0);

    Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("pulsecfg"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn render_footer(state: &ViewerState) -> Paragraph<'static> {
    let mut lines = Vec::new();
    if state.confirm_reset {
        lines.push(Line::from(Span::styled(
            "Reset the whole configuration? (y/n)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    } else if let Some(notice) = state.editor.notices().latest() {
        let color = match notice.level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        lines.push(Line::from(Span::styled(notice.message.clone(), Style::default().fg(color))));
    } else {
        lines.push(Line::from(" "));
    }
    lines.push(Line::from(Span::styled(HELP, Style::default().fg(Color::Gray))));

    Paragraph::new(lines).block(Block::default().borders(Borders::ALL))
}

fn outline_lines(view: &ViewNode) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    push_outline(view, 0, &mut lines);
    lines
}

fn push_outline(node: &ViewNode, depth: usize, out: &mut Vec<Line<'static>>) {
    let pad = "  ".repeat(depth);
    match node {
        ViewNode::Section { children, .. } => {
            for child in children {
                push_outline(child, depth, out);
            }
        }
        ViewNode::Card(card) => {
            out.push(Line::from(vec![
                Span::raw(pad),
                Span::styled(card.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {}", card.badge), Style::default().fg(Color::DarkGray)),
            ]));
            for child in &card.children {
                push_outline(child, depth + 1, out);
            }
        }
        ViewNode::Grid(children) => {
            for child in children {
                push_outline(child, depth, out);
            }
        }
        ViewNode::Field(field) => out.push(Line::from(format!("{pad}{}: {}", field.label, field_value(field)))),
        ViewNode::Tags(picker) => out.push(Line::from(format!(
            "{pad}{}: [{}]",
            picker.label,
            picker.selected.join(", ")
        ))),
        ViewNode::ProtocolPicker { current, .. } => out.push(Line::from(format!(
            "{pad}Protocol: {}",
            current.map(|p| p.key()).unwrap_or("none")
        ))),
        ViewNode::Collapsible { title, children } => {
            out.push(heading_line(&pad, title));
            for child in children {
                push_outline(child, depth + 1, out);
            }
        }
        ViewNode::Heading(title) => out.push(heading_line(&pad, title)),
        ViewNode::Divider => out.push(Line::from(format!("{pad}──"))),
        ViewNode::Empty { title, message } => {
            out.push(Line::from(Span::styled(
                format!("{pad}{title}"),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            out.push(Line::from(format!("{pad}{message}")));
        }
    }
}

fn heading_line(pad: &str, title: &str) -> Line<'static> {
    Line::from(Span::styled(format!("{pad}{title}"), Style::default().fg(Color::Cyan)))
}

fn field_value(field: &InputField) -> String {
    match &field.widget {
        Widget::Password if !field.value.text().is_empty() => "••••••".to_string(),
        Widget::Select(choices) => choices
            .iter()
            .find(|c| c.selected)
            .map(|c| c.label.clone())
            .unwrap_or_default(),
        _ => field.value.text().into_owned(),
    }
}
