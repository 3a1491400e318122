pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, NoticeKind};
use crate::celebration::Celebration;
use crate::quiz::Verdict;

const HORIZONTAL_MARGIN: u16 = 4;
const VERTICAL_MARGIN: u16 = 1;

/// Renders whichever screen the app is on, plus any pending notice.
pub fn ui(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
    render_notice(app, f);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn hint(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

fn frame_chunks(area: Rect, constraints: &[Constraint]) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

/// A rectangle of at most `width` x `height` centred in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// `A`, `B`, ... for option positions; `?` past the alphabet.
fn option_letter(idx: usize) -> char {
    u8::try_from(idx)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
        .unwrap_or('?')
}

pub(crate) fn render_loading(f: &mut Frame) {
    let area = f.area();
    let text = Paragraph::new("A carregar…").alignment(Alignment::Center);
    f.render_widget(text, centered_rect(area.width, 1, area));
}

pub(crate) fn render_login(app: &App, f: &mut Frame) {
    let chunks = frame_chunks(
        f.area(),
        &[
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ],
    );

    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "TVDE: preparação para o exame",
            bold().fg(Color::Cyan),
        )),
        Line::from("Escolha um tema e pratique sem pressão de tempo."),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let input = Paragraph::new(format!("{}▏", app.name_input)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Nome de utilizador"),
    );
    f.render_widget(input, centered_rect(40, 3, chunks[3]));

    f.render_widget(hint("(enter) entrar / (esc) sair"), chunks[5]);
}

fn profile_badge(app: &App) -> Line<'static> {
    match app.profiles.profile() {
        Some(p) if p.is_premium => Line::from(vec![
            Span::styled(p.name.clone(), bold()),
            Span::raw("  "),
            Span::styled("PREMIUM", bold().fg(Color::Yellow)),
        ]),
        Some(p) => Line::from(vec![
            Span::styled(p.name.clone(), bold()),
            Span::styled("  gratuito", Style::default().fg(Color::Gray)),
        ]),
        None => Line::from(""),
    }
}

pub(crate) fn render_menu(app: &App, f: &mut Frame) {
    let chunks = frame_chunks(
        f.area(),
        &[
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ],
    );

    f.render_widget(
        Paragraph::new(profile_badge(app)).alignment(Alignment::Right),
        chunks[0],
    );

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Modo de Estudo", bold().fg(Color::Cyan))),
        Line::from("Escolha um tema específico para praticar."),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let items: Vec<ListItem> = app
        .menu
        .iter()
        .enumerate()
        .map(|(i, filter)| {
            let count = app.count_for(*filter);
            let count_style = if count == 0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Gray)),
                Span::styled(filter.to_string(), bold()),
                Span::styled(format!("  ({count})"), count_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Temas"))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("› ");
    let mut state = ListState::default().with_selected(Some(app.menu_index));
    f.render_stateful_widget(list, chunks[2], &mut state);

    f.render_widget(
        hint("(↑/↓) navegar / (enter) começar / (p)erfil / (q) sair"),
        chunks[3],
    );
}

pub(crate) fn render_question(app: &App, f: &mut Frame) {
    let Some(session) = app.quiz.session() else {
        render_menu(app, f);
        return;
    };
    let question = session.current();

    let chunks = frame_chunks(
        f.area(),
        &[
            Constraint::Length(1), // header
            Constraint::Length(1), // progress
            Constraint::Length(1),
            Constraint::Min(6),    // question and options
            Constraint::Length(4), // feedback
            Constraint::Length(1), // hints
        ],
    );

    let header = Line::from(vec![
        Span::styled(session.filter().to_string(), bold()),
        Span::raw("   "),
        Span::styled(
            format!("{} acertos", session.score()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("   "),
        Span::styled(
            format!("{}/{}", session.position() + 1, session.len()),
            Style::default().fg(Color::Gray),
        ),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Indexed(63)))
        .ratio(session.progress())
        .label("");
    f.render_widget(gauge, chunks[1]);

    let answer = session.answer();
    let mut lines = vec![
        Line::from(Span::styled(question.text.clone(), bold())),
        Line::from(""),
    ];
    for (idx, option) in question.options.iter().enumerate() {
        let letter = option_letter(idx);
        let (style, mark) = match answer {
            Some(_) if idx == question.correct_index => (bold().fg(Color::Green), " ✓"),
            Some(chosen) if chosen == idx => (Style::default().fg(Color::Red), " ✗"),
            Some(_) => (Style::default().add_modifier(Modifier::DIM), ""),
            None => (Style::default(), ""),
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {letter}) "), bold()),
            Span::styled(option.clone(), style),
            Span::styled(mark, style),
        ]));
    }
    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(body, chunks[3]);

    if let (Some(feedback), true) = (&app.feedback, app.config.show_explanations) {
        let (title, color) = if feedback.is_correct {
            ("Correto!", Color::Green)
        } else {
            ("Sabia que...", Color::Cyan)
        };
        let explanation = Paragraph::new(feedback.explanation.clone())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(Span::styled(title, bold().fg(color))),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(explanation, chunks[4]);
    }

    let next = if session.is_last() {
        "concluir"
    } else {
        "próxima"
    };
    let hints = if session.is_answered() {
        format!("(enter) {next} / (r)einiciar / (esc) sair")
    } else {
        let last = option_letter(question.options.len().saturating_sub(1)).to_ascii_lowercase();
        format!("(a-{last}) responder / (r)einiciar / (esc) sair")
    };
    f.render_widget(hint(&hints), chunks[5]);
}

pub(crate) fn render_confirm_restart(app: &App, f: &mut Frame) {
    render_question(app, f);

    let area = centered_rect(52, 5, f.area());
    let dialog = Paragraph::new(vec![
        Line::from("Deseja reiniciar e baralhar as perguntas?"),
        Line::from("O progresso atual será perdido."),
        Line::from(Span::styled("(s)im / (n)ão", Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, area);
    f.render_widget(dialog, area);
}

pub(crate) fn render_summary(app: &App, f: &mut Frame) {
    let Some(summary) = app.summary.as_ref() else {
        render_menu(app, f);
        return;
    };

    let chunks = frame_chunks(
        f.area(),
        &[
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ],
    );

    let color = match summary.verdict {
        Verdict::Pass => Color::Green,
        Verdict::NeedsReview => Color::Yellow,
    };

    let title = Paragraph::new(vec![
        Line::from(Span::styled("Sessão Concluída!", bold().fg(color))),
        Line::from(vec![
            Span::raw("Completou o módulo de "),
            Span::styled(summary.filter.to_string(), bold()),
            Span::raw("."),
        ]),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let score = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{} / {}", summary.score, summary.total),
            bold(),
        )),
        Line::from(Span::styled(
            format!("{}% de acerto", summary.percentage),
            Style::default().fg(color),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Pontuação"));
    f.render_widget(score, centered_rect(40, 5, chunks[2]));

    let message = Paragraph::new(summary.verdict.message())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(message, chunks[3]);

    f.render_widget(
        hint("(r)epetir categoria / (m)enu / (q) sair"),
        chunks[5],
    );

    if app.celebration.is_active {
        render_celebration(&app.celebration, f.area(), f.buffer_mut());
    }
}

pub(crate) fn render_profile(app: &App, f: &mut Frame) {
    let chunks = frame_chunks(
        f.area(),
        &[
            Constraint::Min(0),
            Constraint::Length(6),
            Constraint::Min(0),
            Constraint::Length(1),
        ],
    );

    let lines = match app.profiles.profile() {
        Some(p) => vec![
            Line::from(vec![Span::raw("Nome: "), Span::styled(p.name.clone(), bold())]),
            Line::from(vec![
                Span::raw("Plano: "),
                if p.is_premium {
                    Span::styled("PREMIUM", bold().fg(Color::Yellow))
                } else {
                    Span::raw("Gratuito")
                },
            ]),
            Line::from(Span::styled(
                format!("ID: {}", p.id),
                Style::default().fg(Color::DarkGray),
            )),
        ],
        None => vec![Line::from("Sem sessão iniciada.")],
    };

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Perfil"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, centered_rect(60, 6, chunks[1]));

    f.render_widget(
        hint("(u)pgrade premium / (o) terminar sessão / (b) voltar"),
        chunks[3],
    );
}

fn render_notice(app: &App, f: &mut Frame) {
    let Some(notice) = app.notice.as_ref() else {
        return;
    };
    let area = f.area();
    if area.height < 3 {
        return;
    }

    let color = match notice.kind {
        NoticeKind::Info => Color::Green,
        NoticeKind::Warning => Color::Yellow,
    };
    let width = (notice.text.width() as u16 + 4).min(area.width);
    let rect = Rect::new(area.x + (area.width - width) / 2, area.y, width, 3);
    let widget = Paragraph::new(Span::styled(notice.text.as_str(), bold().fg(color)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(widget, rect);
}

/// Draws confetti and the banner on top of whatever is already in `buf`.
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for confetto in &celebration.confetti {
        if confetto.x < 0.0 || confetto.y < 0.0 {
            continue;
        }
        let (x, y) = (confetto.x as u16, confetto.y as u16);
        if x >= area.width || y >= area.height {
            continue;
        }
        let style = Style::default().fg(colors[confetto.color_index % colors.len()]);
        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&confetto.symbol.to_string());
            cell.set_style(style);
        }
    }

    let banner_width = celebration.banner.width() as u16;
    if banner_width <= area.width && area.height > 2 {
        let x = area.x + (area.width - banner_width) / 2;
        let y = area.y + area.height / 2 - 1;
        buf.set_string(x, y, celebration.banner, bold().fg(Color::Green));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{CategoryFilter, QuestionBank, RawQuestion};
    use crate::config::Config;
    use crate::profile::MemoryStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let bank = QuestionBank::new(vec![RawQuestion {
            id: "q1".into(),
            question: "Qual é o número europeu de emergência?".into(),
            options: vec!["112".into(), "115".into()],
            correct: "112".into(),
            category: "Primeiros Socorros".into(),
            explanation: None,
        }]);
        let mut app = App::new(&bank, Box::new(MemoryStore::new()), Config::default(), Some(1));
        app.start();
        app
    }

    fn render(app: &App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn logged_in() -> App {
        let mut app = app();
        for c in "Ana".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        app
    }

    #[test]
    fn login_screen_shows_input() {
        let mut app = app();
        press(&mut app, KeyCode::Char('R'));
        press(&mut app, KeyCode::Char('u'));
        let content = render(&app);
        assert!(content.contains("Nome de utilizador"));
        assert!(content.contains("Ru"));
    }

    #[test]
    fn menu_lists_categories() {
        let content = render(&logged_in());
        assert!(content.contains("Todos"));
        assert!(content.contains("Lei TVDE"));
        assert!(content.contains("Ana"));
    }

    #[test]
    fn question_screen_shows_options_and_feedback() {
        let mut app = logged_in();
        app.open_category(CategoryFilter::All).unwrap();
        let content = render(&app);
        assert!(content.contains("112"));
        assert!(content.contains("1/1"));

        press(&mut app, KeyCode::Char('a'));
        let content = render(&app);
        assert!(content.contains("Correto!"));
    }

    #[test]
    fn summary_screen_shows_score() {
        let mut app = logged_in();
        app.open_category(CategoryFilter::All).unwrap();
        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Enter);

        let content = render(&app);
        assert!(content.contains("0 / 1"));
        assert!(content.contains("0% de acerto"));
    }

    #[test]
    fn notice_is_rendered() {
        let mut app = logged_in();
        press(&mut app, KeyCode::Char('2'));
        let content = render(&app);
        assert!(content.contains("Sem perguntas"));
    }

    #[test]
    fn small_terminal_does_not_panic() {
        let mut app = logged_in();
        app.open_category(CategoryFilter::All).unwrap();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);

        let backend = TestBackend::new(10, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(&app, f)).unwrap();
    }

    #[test]
    fn answer_hint_follows_the_option_count() {
        let mut app = logged_in();
        app.open_category(CategoryFilter::All).unwrap();
        let content = render(&app);
        // the only question has two options
        assert!(content.contains("(a-b) responder"));
        assert!(!content.contains("(a-d)"));
    }

    #[test]
    fn option_letters() {
        assert_eq!(option_letter(0), 'A');
        assert_eq!(option_letter(8), 'I');
        assert_eq!(option_letter(25), 'Z');
        assert_eq!(option_letter(26), '?');
        assert_eq!(option_letter(300), '?');
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(40, 3, area), Rect::new(0, 3, 20, 3));
        assert_eq!(centered_rect(10, 2, area), Rect::new(5, 4, 10, 2));
    }
}
