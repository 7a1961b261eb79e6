//! Terminal front end

use crate::App;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gotd_launcher::GameState;
use gotd_library::GameInfo;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

const PAGE_FILE: &str = "gotd.html";

/// Screen state
struct Screen {
    app: App,
    game: Option<GameInfo>,
    rating: i64,
    average: f64,
    status: String,
    should_quit: bool,
}

impl Screen {
    async fn new(app: App) -> Self {
        let mut screen = Self {
            app,
            game: None,
            rating: 0,
            average: 0.0,
            status: "Ready".to_string(),
            should_quit: false,
        };
        screen.refresh().await;
        screen
    }

    async fn refresh(&mut self) {
        self.game = self.app.manager.todays_game().await;
        match &self.game {
            Some(game) => {
                self.rating = self.app.ratings.rating(&game.id, &self.app.user_id).await;
                self.average = self.app.ratings.average(&game.id).await;
            }
            None => {
                self.rating = 0;
                self.average = 0.0;
                self.status = "No games found".to_string();
            }
        }
    }

    async fn handle_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c @ '0'..='5') => self.rate(i64::from(c as u8 - b'0')).await,
            KeyCode::Char('r') => {
                self.app.manager.reset_history();
                self.refresh().await;
                self.status = "History reset".to_string();
            }
            KeyCode::Char('p') => self.write_page(),
            KeyCode::Enter | KeyCode::Char('s') => self.start().await,
            _ => {}
        }
    }

    async fn rate(&mut self, stars: i64) {
        let Some(game) = &self.game else {
            return;
        };
        match self.app.ratings.rate(&game.id, &self.app.user_id, stars).await {
            Ok(stored) => {
                self.rating = stored;
                self.average = self.app.ratings.average(&game.id).await;
                self.status = format!("Rated {}/5", stored);
            }
            Err(e) => self.status = format!("Rating failed: {}", e),
        }
    }

    fn write_page(&mut self) {
        let Some(game) = &self.game else {
            return;
        };
        let path = PathBuf::from(PAGE_FILE);
        self.status = match std::fs::write(&path, self.app.boot_page(game)) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(e) => format!("Failed to write page: {}", e),
        };
    }

    async fn start(&mut self) {
        let Some(game) = self.game.clone() else {
            return;
        };
        self.status = match self.app.manager.start_game(&game).await {
            Ok(()) => format!("Started {}", game.name),
            // Generic message; details go to the log
            Err(_) => "Failed to start game, press Enter to retry".to_string(),
        };
    }
}

pub async fn run(app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut screen = Screen::new(app).await;
    let result = event_loop(&mut terminal, &mut screen).await;

    if screen.app.manager.state() == GameState::Running {
        let _ = screen.app.manager.stop_game().await;
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    screen: &mut Screen,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    while !screen.should_quit {
        terminal.draw(|f| draw_ui(f, screen))?;

        if event::poll(tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            screen.handle_input(key.code).await;
        }
    }
    Ok(())
}

fn draw_ui(frame: &mut Frame, screen: &Screen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.size());

    draw_header(frame, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    draw_game(frame, body[0], screen);
    draw_history(frame, body[1], screen);

    draw_footer(frame, chunks[2], screen);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new("C64 Game of the Day")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn stars(rating: i64) -> String {
    let filled = rating.clamp(0, 5) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn field<'a>(label: &'a str, value: impl Into<String>) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value.into()),
    ])
}

fn draw_game(frame: &mut Frame, area: Rect, screen: &Screen) {
    let content = match &screen.game {
        Some(game) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    game.name.clone(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];
            if let Some(description) = &game.description {
                lines.push(Line::from(description.clone()));
                lines.push(Line::from(""));
            }
            if let Some(year) = game.year {
                lines.push(field("Year: ", year.to_string()));
            }
            if let Some(publisher) = &game.publisher {
                lines.push(field("Publisher: ", publisher.clone()));
            }
            if let Some(genre) = &game.genre {
                lines.push(field("Genre: ", genre.clone()));
            }
            if let Some(players) = &game.players {
                lines.push(field("Players: ", players.clone()));
            }
            lines.push(field("Image: ", game.image_path.clone()));
            lines.push(Line::from(""));
            lines.push(field("Your rating: ", stars(screen.rating)));
            lines.push(field("Average: ", format!("{:.1}", screen.average)));
            lines.push(field("Emulator: ", screen.app.manager.state().as_str()));
            Text::from(lines)
        }
        None => Text::raw(gotd_config::NOT_FOUND_GAME_NAME),
    };

    let paragraph = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).title("Today"))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn draw_history(frame: &mut Frame, area: Rect, screen: &Screen) {
    let mut entries: Vec<_> = screen.app.manager.history().into_iter().collect();
    entries.sort_by(|a, b| b.1.last_played_time.cmp(&a.1.last_played_time));

    let items: Vec<ListItem> = entries
        .into_iter()
        .map(|(id, entry)| {
            ListItem::new(format!(
                "{:<20} {} ({}x)",
                id, entry.last_played, entry.play_count
            ))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("History"));
    frame.render_widget(list, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, screen: &Screen) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let help = Paragraph::new("[Enter] Start  [0-5] Rate  [R] Reset  [P] Page  [Q] Quit")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));

    let status = Paragraph::new(screen.status.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, chunks[0]);
    frame.render_widget(status, chunks[1]);
}
