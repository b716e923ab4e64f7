use crate::client::GatewayClient;
use crate::gateway::QueryGateway;
use crate::protocol::GatewayResult;
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use std::io;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;
type UiResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const INPUT_HEIGHT: u16 = 3;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

// Restores terminal settings even if the loop exits early.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().flush();
    }
}

/// Where submitted queries go: the gateway in this process, or a remote one.
#[derive(Clone)]
pub enum Backend {
    Local(Arc<QueryGateway>),
    Remote(GatewayClient),
}

impl Backend {
    pub async fn ask(&self, query: &str) -> GatewayResult {
        match self {
            Backend::Local(gateway) => gateway.handle(query).await,
            Backend::Remote(client) => match client.ask(query).await {
                Ok(result) => result,
                Err(err) => {
                    warn!(error = %err, server = client.base_url(), "gateway request failed");
                    GatewayResult::error(UNEXPECTED_ERROR_MESSAGE)
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    User(String),
    Assistant { text: String, is_error: bool },
    Info(String),
}

#[derive(Debug, Clone)]
struct LineSpec {
    text: String,
    style: Style,
}

impl LineSpec {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

impl ChatMessage {
    /// An empty answer or error renders as the generic fallback.
    pub fn from_result(result: &GatewayResult) -> Self {
        if result.message().is_empty() {
            return ChatMessage::Assistant {
                text: UNEXPECTED_ERROR_MESSAGE.to_string(),
                is_error: true,
            };
        }
        ChatMessage::Assistant {
            text: result.message().to_string(),
            is_error: result.is_error(),
        }
    }

    fn bubble(header: &str, body: &str, color: Color) -> Vec<LineSpec> {
        let header_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
        let body_style = Style::default().fg(color);
        let mut lines = vec![LineSpec::new(header, header_style)];
        for line in body.lines() {
            lines.push(LineSpec::new(format!("  {}", line), body_style));
        }
        lines
    }

    fn line_specs(&self) -> Vec<LineSpec> {
        match self {
            ChatMessage::User(msg) => Self::bubble("You:", msg, Color::Blue),
            ChatMessage::Assistant { text, is_error } => {
                let color = if *is_error { Color::Red } else { Color::Yellow };
                Self::bubble("RailMadad AI:", text, color)
            }
            ChatMessage::Info(msg) => {
                let style = Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC);
                msg.lines().map(|line| LineSpec::new(line, style)).collect()
            }
        }
    }

    fn to_text(&self) -> Text<'static> {
        let lines = self
            .line_specs()
            .into_iter()
            .map(|spec| Line::from(Span::styled(spec.text, spec.style)))
            .collect::<Vec<_>>();
        Text::from(lines)
    }

    fn rendered_height(&self, width: u16) -> u16 {
        let width = width.max(1) as usize;
        self.line_specs()
            .iter()
            .map(|spec| spec.text.chars().count().max(1).div_ceil(width))
            .sum::<usize>() as u16
    }
}

#[derive(Debug)]
enum UiEvent {
    Reply(GatewayResult),
}

/// Single-line prompt; `cursor` counts chars, not bytes.
#[derive(Debug, Default)]
struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    fn byte_index(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.text.insert(idx, c);
        self.cursor += 1;
    }

    fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let idx = self.byte_index(self.cursor);
        self.text.remove(idx);
    }

    fn delete_forward(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index(self.cursor);
            self.text.remove(idx);
        }
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.len();
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn render(&self, disabled: bool) -> Text<'static> {
        if self.text.is_empty() {
            return Text::from(Span::styled(
                "Type your question...",
                Style::default().fg(Color::DarkGray),
            ));
        }
        let style = if disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        Text::from(Span::styled(self.text.clone(), style))
    }
}

pub struct App {
    input: InputBuffer,
    should_quit: bool,
    sender: mpsc::Sender<UiEvent>,
    receiver: mpsc::Receiver<UiEvent>,
    is_loading: bool,
    backend: Backend,
}

impl App {
    pub fn new(backend: Backend) -> Self {
        let (sender, receiver) = mpsc::channel(16);

        Self {
            input: InputBuffer::default(),
            should_quit: false,
            sender,
            receiver,
            is_loading: false,
            backend,
        }
    }

    fn draw(&self, f: &mut Frame) {
        let area = f.area();
        let title = if self.is_loading {
            " Ask RailMadad AI (Enter to send, Esc to quit) [Thinking...] "
        } else {
            " Ask RailMadad AI (Enter to send, Esc to quit) "
        };

        let input_paragraph = Paragraph::new(self.input.render(self.is_loading))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .wrap(Wrap { trim: false });

        f.render_widget(input_paragraph, area);

        f.set_cursor_position(cursor_position(area, self.input.cursor));
    }

    fn append_message(&mut self, terminal: &mut TuiTerminal, message: ChatMessage) -> UiResult<()> {
        let width = terminal.size()?.width;
        let height = message.rendered_height(width).saturating_add(1);
        let mut text = message.to_text();
        text.extend(Text::raw("\n"));
        // Insert above the inline viewport so the log stays in scrollback.
        terminal.insert_before(height, |buf| {
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .render(buf.area, buf);
        })?;
        Ok(())
    }

    /// Sends the current input unless it is blank or a reply is still pending.
    fn submit(&mut self, terminal: &mut TuiTerminal) -> UiResult<()> {
        if self.is_loading || self.input.is_blank() {
            return Ok(());
        }

        let query = self.input.take();
        self.append_message(terminal, ChatMessage::User(query.clone()))?;
        self.is_loading = true;

        let backend = self.backend.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = backend.ask(&query).await;
            let _ = sender.send(UiEvent::Reply(result)).await;
        });
        Ok(())
    }

    fn handle_events(&mut self, terminal: &mut TuiTerminal) -> UiResult<bool> {
        while let Ok(event) = self.receiver.try_recv() {
            match event {
                UiEvent::Reply(result) => {
                    self.append_message(terminal, ChatMessage::from_result(&result))?;
                    self.is_loading = false;
                }
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    self.should_quit = true;
                    return Ok(false);
                }

                match key.code {
                    KeyCode::Esc => {
                        self.should_quit = true;
                        return Ok(false);
                    }
                    KeyCode::Enter => self.submit(terminal)?,
                    KeyCode::Char(c) if !self.is_loading => self.input.insert_char(c),
                    KeyCode::Backspace if !self.is_loading => self.input.delete_char(),
                    KeyCode::Delete if !self.is_loading => self.input.delete_forward(),
                    KeyCode::Left => self.input.move_left(),
                    KeyCode::Right => self.input.move_right(),
                    KeyCode::Home => self.input.home(),
                    KeyCode::End => self.input.end(),
                    _ => {}
                }
            }
        }

        Ok(true)
    }
}

// Inside the left border, clamped to the last column before the right one.
fn cursor_position(area: Rect, cursor: usize) -> (u16, u16) {
    let offset = u16::try_from(cursor).unwrap_or(u16::MAX);
    let max_x = area.x + area.width.saturating_sub(2);
    let x = area.x.saturating_add(1).saturating_add(offset).min(max_x);
    (x, area.y + 1)
}

pub fn run_tui(backend: Backend) -> UiResult<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let (_, rows) = size()?;
    if rows > 0 {
        // Push existing screen content into scrollback without clearing it.
        for _ in 0..rows {
            writeln!(stdout)?;
        }
        stdout.flush()?;
    }
    execute!(stdout, MoveTo(0, 0))?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::with_options(
        backend_term,
        TerminalOptions {
            viewport: Viewport::Inline(INPUT_HEIGHT),
        },
    )?;

    let mut app = App::new(backend);

    let _guard = TerminalGuard;

    app.append_message(
        &mut terminal,
        ChatMessage::Info(
            "Welcome to RailMadad AI!\nI'm here to help you with your Indian Railways queries."
                .to_string(),
        ),
    )?;
    terminal.draw(|f| app.draw(f))?;

    while !app.should_quit {
        if !app.handle_events(&mut terminal)? {
            break;
        }

        terminal.draw(|f| app.draw(f))?;

        std::thread::sleep(Duration::from_millis(10));
    }

    disable_raw_mode()?;
    io::stdout().flush()?;

    Ok(())
}
