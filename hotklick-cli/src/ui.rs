//! Terminal UI rendering for HotKlick

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Context, Painter, Shape},
        Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
    },
    Frame,
};

use hotklick_core::{
    ContentKind, ContentMode, Exercise, Mode, Point, RenderRequest, Revealed, SaveState,
};

use crate::{Field, Prompt, Tui};

// Catppuccin Mocha colors
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const RED: Color = Color::Rgb(243, 139, 168);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);
const TEAL: Color = Color::Rgb(148, 226, 213);

/// Downsampled copy of the exercise image, drawn as canvas pixels
pub struct Preview {
    /// Size of the full image
    pub image_width: u32,
    pub image_height: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl Shape for Preview {
    fn draw(&self, painter: &mut Painter) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let sx = self.image_width as f64 / self.width as f64;
        let sy = self.image_height as f64 / self.height as f64;

        for (i, [r, g, b]) in self.pixels.iter().enumerate() {
            let px = (i as u32 % self.width) as f64;
            let py = (i as u32 / self.width) as f64;
            let x = (px + 0.5) * sx;
            let y = self.image_height as f64 - (py + 0.5) * sy;
            if let Some((cx, cy)) = painter.get_point(x, y) {
                painter.paint(cx, cy, Color::Rgb(*r, *g, *b));
            }
        }
    }
}

/// Where the image was drawn, for mapping mouse cells back to pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasArea {
    pub rect: Rect,
    pub image_width: u32,
    pub image_height: u32,
}

impl CanvasArea {
    /// Image coordinates of the center of a terminal cell
    pub fn to_image(&self, column: u16, row: u16) -> Option<Point> {
        let r = self.rect;
        if r.width == 0 || r.height == 0 {
            return None;
        }
        if column < r.x || column >= r.x + r.width || row < r.y || row >= r.y + r.height {
            return None;
        }
        let x = (column - r.x) as f64 + 0.5;
        let y = (row - r.y) as f64 + 0.5;
        Some(Point::new(
            x / r.width as f64 * self.image_width as f64,
            y / r.height as f64 * self.image_height as f64,
        ))
    }
}

/// Largest rect inside `area` with the image's aspect ratio. A cell holds
/// two half-block pixels stacked vertically.
pub fn fit_canvas(area: Rect, image_width: u32, image_height: u32) -> Rect {
    if image_width == 0 || image_height == 0 || area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }
    let aspect = image_width as f64 / image_height as f64;

    let mut width = area.width;
    let mut height = (width as f64 / (2.0 * aspect)).round() as u16;
    if height > area.height {
        height = area.height;
        width = ((height as f64 * 2.0 * aspect).round() as u16).min(area.width);
    }
    let height = height.max(1);
    let width = width.max(1);

    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

pub fn draw(frame: &mut Frame, tui: &Tui) -> Option<CanvasArea> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, tui, chunks[0]);
    let canvas = draw_main_area(frame, tui, chunks[1]);
    draw_status_bar(frame, tui, chunks[2]);

    // Draw popups/overlays
    match &tui.prompt {
        Some(Prompt::TextEditor { label, text, field, .. }) => {
            draw_text_editor(frame, label, text, *field)
        }
        Some(Prompt::AudioEditor { path, .. }) => draw_audio_editor(frame, path),
        Some(Prompt::ConfirmDelete { label, .. }) => draw_confirm_delete(frame, label),
        Some(Prompt::ContentPicker { selected }) => draw_content_picker(frame, *selected),
        Some(Prompt::TaskCount { mode, input }) => draw_task_count(frame, *mode, input),
        Some(Prompt::ExerciseList {
            exercises,
            selected,
        }) => draw_exercise_list(frame, exercises, *selected),
        Some(Prompt::Help) => draw_help(frame),
        None => {}
    }

    canvas
}

fn draw_title_bar(frame: &mut Frame, tui: &Tui, area: Rect) {
    let app = &tui.app;
    let size = app
        .exercise()
        .map(|e| format!(" ({}x{})", e.width, e.height))
        .unwrap_or_default();

    let title_text = format!(
        " HotKlick - {}{} [{} regions]",
        app.title(),
        size,
        tui.frame.regions.len()
    );

    let title_bar = Paragraph::new(title_text).style(Style::default().fg(TEXT).bg(SURFACE0));

    frame.render_widget(title_bar, area);
}

fn draw_main_area(frame: &mut Frame, tui: &Tui, area: Rect) -> Option<CanvasArea> {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Image
            Constraint::Length(34), // Sidebar
        ])
        .split(area);

    let canvas = draw_image(frame, tui, chunks[0]);
    draw_sidebar(frame, tui, chunks[1]);
    canvas
}

fn draw_image(frame: &mut Frame, tui: &Tui, area: Rect) -> Option<CanvasArea> {
    let request = &tui.frame;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(mode_color(request.mode)))
        .title(format!("Image [{}]", request.mode.as_str()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let exercise = tui.app.exercise()?;
    let (w, h) = (exercise.width, exercise.height);
    let rect = fit_canvas(inner, w, h);

    let canvas = Canvas::default()
        .marker(Marker::HalfBlock)
        .x_bounds([0.0, w as f64])
        .y_bounds([0.0, h as f64])
        .paint(|ctx| {
            if let Some(preview) = &tui.preview {
                ctx.draw(preview);
            }
            draw_regions(ctx, request, h as f64);
            if let Some((point, radius)) = tui.pulse_ring() {
                ctx.draw(&Circle {
                    x: point.x,
                    y: h as f64 - point.y,
                    radius,
                    color: TEAL,
                });
            }
        });
    frame.render_widget(canvas, rect);

    Some(CanvasArea {
        rect,
        image_width: w,
        image_height: h,
    })
}

fn draw_regions(ctx: &mut Context<'_>, request: &RenderRequest, height: f64) {
    if request.show_regions {
        for region in &request.regions {
            let color = kind_color(region.content_kind());
            let y = height - region.center.y;
            ctx.draw(&Circle {
                x: region.center.x,
                y,
                radius: region.radius() as f64,
                color,
            });
            let label = if region.save_state() == SaveState::Failed {
                format!("{}!", region.label())
            } else {
                region.label().to_string()
            };
            ctx.print(
                region.center.x,
                y,
                Line::from(Span::styled(label, Style::default().fg(color))),
            );
        }
    }

    if let Some(highlight) = request.highlight.as_ref().filter(|h| h.on) {
        let y = height - highlight.center.y;
        ctx.draw(&Circle {
            x: highlight.center.x,
            y,
            radius: highlight.radius as f64,
            color: RED,
        });
        ctx.print(
            highlight.center.x,
            y,
            Line::from(Span::styled(
                highlight.label.clone(),
                Style::default().fg(RED).add_modifier(Modifier::BOLD),
            )),
        );
    }
}

fn draw_sidebar(frame: &mut Frame, tui: &Tui, area: Rect) {
    let app = &tui.app;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SUBTEXT0))
        .title("Details");

    let heading = |text: &str| {
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
        ))
    };

    let mut lines = vec![
        heading("Mode"),
        Line::from(format!("  {}", tui.frame.mode.as_str())),
    ];

    if tui.frame.mode == Mode::Edit {
        lines.push(Line::from(format!(
            "  New region radius: {}",
            tui.frame.default_radius
        )));
        let failed = app.unsaved_count();
        if failed > 0 {
            lines.push(Line::from(Span::styled(
                format!("  {failed} unsaved (r to retry)"),
                Style::default().fg(RED),
            )));
        }
        lines.push(Line::from(""));
        lines.push(heading("Legend"));
        for kind in ContentKind::all() {
            lines.push(Line::from(Span::styled(
                format!("  o {}", kind.as_str()),
                Style::default().fg(kind_color(*kind)),
            )));
        }
    }

    if let Some(task) = app.current_task() {
        lines.push(Line::from(""));
        lines.push(heading("Quiz"));
        let wrong = app.quiz().map_or(0, |q| q.wrong_count());
        lines.push(Line::from(format!(
            "  Task {}/{}  correct {}  wrong {}",
            task.index + 1,
            task.total,
            task.correct,
            wrong
        )));
        if let Some(text) = task.text {
            lines.push(Line::from(Span::styled(
                format!("  Find: {text}"),
                Style::default().fg(YELLOW),
            )));
        }
        if let Some(audio) = task.audio {
            lines.push(Line::from(Span::styled(
                format!("  Listen: {audio}"),
                Style::default().fg(BLUE),
            )));
        }
        if app.quiz().is_some_and(|q| q.is_awaiting_advance()) {
            lines.push(Line::from(Span::styled(
                "  next task...",
                Style::default().fg(SUBTEXT0),
            )));
        }
    } else if let Some(summary) = app.last_summary() {
        lines.push(Line::from(""));
        lines.push(heading("Last quiz"));
        lines.push(Line::from(format!(
            "  {}/{} correct, {} wrong",
            summary.correct, summary.total, summary.wrong
        )));
        lines.push(Line::from(Span::styled(
            format!("  Score {}%", summary.final_score),
            Style::default().fg(GREEN).add_modifier(Modifier::BOLD),
        )));
    }

    if let Some(revealed) = app.revealed() {
        lines.push(Line::from(""));
        lines.push(heading("Text (Esc to close)"));
        lines.push(revealed_line(revealed));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Revealed text with links underlined
fn revealed_line(revealed: &Revealed) -> Line<'static> {
    match revealed {
        Revealed::Text { text, links, .. } => {
            let mut spans = vec![Span::raw("  ")];
            let mut pos = 0;
            for link in links {
                if link.range.start > pos {
                    spans.push(Span::styled(
                        text[pos..link.range.start].to_string(),
                        Style::default().fg(TEXT),
                    ));
                }
                spans.push(Span::styled(
                    text[link.range.clone()].to_string(),
                    Style::default().fg(BLUE).add_modifier(Modifier::UNDERLINED),
                ));
                pos = link.range.end;
            }
            if pos < text.len() {
                spans.push(Span::styled(text[pos..].to_string(), Style::default().fg(TEXT)));
            }
            Line::from(spans)
        }
        Revealed::Placeholder { .. } => Line::from(Span::styled(
            format!("  {}", revealed.message()),
            Style::default().fg(SUBTEXT0).add_modifier(Modifier::ITALIC),
        )),
    }
}

fn draw_status_bar(frame: &mut Frame, tui: &Tui, area: Rect) {
    let status = tui.app.status_message.as_deref().unwrap_or("");

    let help_hint = match tui.frame.mode {
        Mode::Edit => "hold: add | 2x: text | hold region: audio | click: delete | +/- radius",
        Mode::Practice => "click: reveal | 2x: text + audio | e/p/d modes | ? help",
        Mode::Deepening => "click the region that matches | s stop | ? help",
    };

    let status_text = format!(
        " {} | {}",
        tui.frame.mode.as_str(),
        if status.is_empty() { help_hint } else { status },
    );

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));

    frame.render_widget(status_bar, area);
}

fn draw_text_editor(frame: &mut Frame, label: &str, text: &str, field: Field) {
    let area = centered_rect(60, 8, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN))
        .title("Edit text (Tab switch, Enter save, Esc cancel)");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let field_line = |name: &str, value: &str, active: bool| {
        let style = if active {
            Style::default().fg(TEXT).bg(SURFACE1)
        } else {
            Style::default().fg(SUBTEXT0)
        };
        let cursor = if active { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{name:<7}"), Style::default().fg(MAUVE)),
            Span::styled(format!("{value}{cursor}"), style),
        ])
    };

    let lines = vec![
        field_line("Label", label, field == Field::Label),
        Line::from(""),
        field_line("Text", text, field == Field::Text),
    ];
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn draw_audio_editor(frame: &mut Frame, path: &str) {
    let area = centered_rect(60, 5, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Audio file (empty removes audio)");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input = Paragraph::new(format!("{path}_")).style(Style::default().fg(TEXT));
    frame.render_widget(input, inner);
}

fn draw_confirm_delete(frame: &mut Frame, label: &str) {
    let area = centered_rect(40, 5, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(RED))
        .title("Delete region");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = Paragraph::new(format!("Delete {label}? (y/n)")).style(Style::default().fg(TEXT));
    frame.render_widget(text, inner);
}

fn draw_content_picker(frame: &mut Frame, selected: usize) {
    let area = centered_rect(40, 7, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MAUVE))
        .title("Quiz on (j/k, Enter)");

    let items: Vec<ListItem> = ContentMode::all()
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let is_selected = i == selected;
            let marker = if is_selected { ">" } else { " " };
            let style = if is_selected {
                Style::default().fg(TEAL).bg(SURFACE1)
            } else {
                Style::default().fg(TEAL)
            };
            ListItem::new(format!("{} {} {}", i + 1, marker, mode.as_str())).style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

fn draw_exercise_list(frame: &mut Frame, exercises: &[Exercise], selected: usize) {
    let height = (exercises.len() as u16).min(12) + 2;
    let area = centered_rect(60, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Exercises (j/k, Enter open, Esc close)");

    // Keep the selection inside the visible window
    let visible = height.saturating_sub(2) as usize;
    let skip = (selected + 1).saturating_sub(visible);

    let items: Vec<ListItem> = exercises
        .iter()
        .enumerate()
        .skip(skip)
        .take(visible)
        .map(|(i, exercise)| {
            let is_selected = i == selected;
            let marker = if is_selected { ">" } else { " " };
            let style = if is_selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };
            ListItem::new(format!(
                "{} {}  {}",
                marker,
                exercise.name,
                exercise.created_at.format("%Y-%m-%d %H:%M")
            ))
            .style(style)
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

fn draw_task_count(frame: &mut Frame, mode: ContentMode, input: &str) {
    let area = centered_rect(40, 5, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN))
        .title(format!("Number of tasks ({})", mode.as_str()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input = Paragraph::new(format!("{input}_")).style(Style::default().fg(TEXT));
    frame.render_widget(input, inner);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(60, 23, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let section = |name: &str| {
        Line::from(Span::styled(
            name.to_string(),
            Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        section("Modes"),
        Line::from("  e / 1    Edit regions"),
        Line::from("  p / 2    Practice"),
        Line::from("  d / 3    Start a quiz"),
        Line::from("  o        Open another exercise"),
        Line::from(""),
        section("Edit"),
        Line::from("  hold on empty space   Add region"),
        Line::from("  hold on region        Set audio"),
        Line::from("  double-click region   Set label and text"),
        Line::from("  click region          Delete"),
        Line::from("  + / -                 Radius of new regions"),
        Line::from("  r                     Retry failed saves"),
        Line::from(""),
        section("Practice / Quiz"),
        Line::from("  click / double-click  Reveal text, play audio"),
        Line::from("  Esc                   Close text"),
        Line::from("  s                     Stop quiz"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn kind_color(kind: ContentKind) -> Color {
    match kind {
        ContentKind::Complete => GREEN,
        ContentKind::AudioOnly => BLUE,
        ContentKind::TextOnly => YELLOW,
        ContentKind::Empty => RED,
    }
}

fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Edit => YELLOW,
        Mode::Practice => BLUE,
        Mode::Deepening => MAUVE,
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
