//! HotKlick CLI - Terminal trainer for annotated image regions

mod io;
mod logging;
mod ui;

use std::io::stdout;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use hotklick_core::{
    App, AudioRef, ContentMode, Effect, Exercise, Mode, Point, PointerEvent, RegionId,
    RegionStore, RenderRequest,
};

use crate::ui::{CanvasArea, Preview};

/// Longest wait between two loop iterations
const IDLE_POLL: Duration = Duration::from_millis(250);
const PULSE_DURATION: Duration = Duration::from_millis(400);
/// Preview resolution; the canvas shows one pixel per half cell
const PREVIEW_MAX: (u32, u32) = (320, 200);

/// Which text editor field receives input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Label,
    Text,
}

/// Modal prompt on top of the image
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    TextEditor {
        region: RegionId,
        label: String,
        text: String,
        field: Field,
    },
    AudioEditor {
        region: RegionId,
        path: String,
    },
    ConfirmDelete {
        region: RegionId,
        label: String,
    },
    ContentPicker {
        selected: usize,
    },
    TaskCount {
        mode: ContentMode,
        input: String,
    },
    /// Stored exercises, newest first
    ExerciseList {
        exercises: Vec<Exercise>,
        selected: usize,
    },
    Help,
}

impl Prompt {
    /// Exercise picker, or `None` when nothing has been opened yet
    fn exercise_list(mut exercises: Vec<Exercise>) -> Option<Prompt> {
        if exercises.is_empty() {
            return None;
        }
        exercises.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Some(Prompt::ExerciseList {
            exercises,
            selected: 0,
        })
    }
}

/// Work for the event loop, which owns the store and the data directory
#[derive(Debug, Clone, PartialEq)]
enum Request {
    ListExercises,
    Open(Exercise),
}

#[derive(Debug, Clone, Copy)]
struct Pulse {
    center: Point,
    radius: u32,
    started: Duration,
}

/// Terminal-side state around the core [`App`]
pub struct Tui {
    pub app: App,
    pub prompt: Option<Prompt>,
    /// Last render request from the core
    pub frame: RenderRequest,
    pub preview: Option<Preview>,
    canvas: Option<CanvasArea>,
    pulse: Option<Pulse>,
    request: Option<Request>,
}

impl Tui {
    pub fn new(app: App) -> Self {
        let frame = app.render_request();
        Self {
            app,
            prompt: None,
            frame,
            preview: None,
            canvas: None,
            pulse: None,
            request: None,
        }
    }

    /// Expanding ring after a region was created
    pub fn pulse_ring(&self) -> Option<(Point, f64)> {
        let pulse = self.pulse?;
        let age = self.app.now().saturating_sub(pulse.started);
        if age >= PULSE_DURATION {
            return None;
        }
        let grow = age.as_secs_f64() / PULSE_DURATION.as_secs_f64();
        Some((pulse.center, pulse.radius as f64 * (1.0 + grow * 0.5)))
    }

    fn poll_timeout(&self) -> Duration {
        let mut timeout = IDLE_POLL;
        if let Some(deadline) = self.app.next_deadline() {
            timeout = timeout.min(deadline.saturating_sub(self.app.now()));
        }
        if self.pulse_ring().is_some() {
            timeout = timeout.min(Duration::from_millis(40));
        }
        timeout
    }

    /// Pull the latest render request from the core, if any
    fn sync_frame(&mut self) {
        if let Some(frame) = self.app.take_render_request() {
            self.frame = frame;
        }
        if self.pulse.is_some() && self.pulse_ring().is_none() {
            self.pulse = None;
        }
    }

    fn handle_effects(&mut self) {
        for effect in self.app.take_effects() {
            tracing::debug!("effect {:?}", effect);
            match effect {
                Effect::OpenTextEditor { region } => {
                    if let Some(r) = self.app.index().get(region) {
                        self.prompt = Some(Prompt::TextEditor {
                            region,
                            label: r.label().to_string(),
                            text: r.text().unwrap_or_default().to_string(),
                            field: Field::Text,
                        });
                    }
                }
                Effect::OpenAudioEditor { region } => {
                    if let Some(r) = self.app.index().get(region) {
                        self.prompt = Some(Prompt::AudioEditor {
                            region,
                            path: r.audio().map(|a| a.to_string()).unwrap_or_default(),
                        });
                    }
                }
                Effect::ConfirmDelete { region, label } => {
                    self.prompt = Some(Prompt::ConfirmDelete { region, label });
                }
                Effect::PlayCue => self.app.set_status("*click*"),
                Effect::PlayAudio(audio) => self.app.set_status(&format!("Playing audio: {audio}")),
                Effect::NoContent { .. } => {
                    self.app.set_status("This region has no text or audio")
                }
                Effect::Pulse(center) => {
                    self.pulse = Some(Pulse {
                        center,
                        radius: self.app.default_radius(),
                        started: self.app.now(),
                    });
                }
                Effect::Answered { correct: true } => self.app.set_status("Correct!"),
                Effect::Answered { correct: false } => self.app.set_status("Wrong"),
                Effect::QuizFinished(summary) => self.app.set_status(&format!(
                    "Quiz finished: {}/{} correct, score {}%",
                    summary.correct, summary.total, summary.final_score
                )),
                Effect::LabelsExhausted => {
                    self.app.set_status("No labels left, Z9 is the last one")
                }
            }
        }
    }
}

/// Command line arguments: `hotklick [--debug] [--name NAME] <image>`
#[derive(Debug, Default, PartialEq)]
struct Args {
    image: Option<String>,
    name: Option<String>,
    debug: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" => parsed.debug = true,
                "--name" => match args.next() {
                    Some(name) => parsed.name = Some(name),
                    None => bail!("--name needs a value"),
                },
                flag if flag.starts_with("--") => bail!("unknown option {flag}"),
                _ => parsed.image = Some(arg),
            }
        }
        Ok(parsed)
    }
}

fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    let dir = io::hotklick_dir()?;
    let _guard = logging::init(args.debug, &dir)?;

    let settings = match io::load_settings(&dir) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("using default settings: {:#}", e);
            Default::default()
        }
    };
    let mut store = io::JsonStore::open(&dir)?;
    let mut tui = Tui::new(App::new(settings));

    // Load the image before the first frame is drawn
    if let Some(image) = &args.image {
        match open(&mut tui, &mut store, &dir, image, args.name.as_deref()) {
            Ok(()) => tui.app.set_status(&format!("Loaded {}", image)),
            Err(e) => tui.app.set_status(&format!("Error: {:#}", e)),
        }
    } else {
        handle_request(&mut tui, &mut store, &dir, Request::ListExercises);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut tui, &mut store, &dir);

    let report = tui.app.flush(&mut store);
    if !report.is_clean() {
        tracing::warn!("{} regions left unsaved on exit", report.failed.len());
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn open(
    tui: &mut Tui,
    store: &mut io::JsonStore,
    dir: &Path,
    image: &str,
    name: Option<&str>,
) -> Result<()> {
    let exercise = io::open_exercise(dir, image, name)?;
    show_exercise(tui, store, exercise)
}

/// Load an exercise's regions and its preview
fn show_exercise(tui: &mut Tui, store: &mut dyn RegionStore, exercise: Exercise) -> Result<()> {
    tui.preview = match io::load_preview(&exercise, PREVIEW_MAX.0, PREVIEW_MAX.1) {
        Ok(preview) => Some(preview),
        Err(e) => {
            tracing::warn!("no preview: {:#}", e);
            None
        }
    };
    tui.app.load_exercise(exercise, store)?;
    Ok(())
}

fn handle_request(tui: &mut Tui, store: &mut dyn RegionStore, dir: &Path, request: Request) {
    match request {
        Request::ListExercises => match io::load_exercises(dir) {
            Ok(exercises) => match Prompt::exercise_list(exercises) {
                Some(prompt) => tui.prompt = Some(prompt),
                None => tui
                    .app
                    .set_status("No exercises yet. Pass an image path as argument."),
            },
            Err(e) => tui.app.set_status(&format!("Error: {:#}", e)),
        },
        Request::Open(exercise) => {
            let name = exercise.name.clone();
            match show_exercise(tui, store, exercise) {
                Ok(()) => tui.app.set_status(&format!("Loaded {}", name)),
                Err(e) => tui.app.set_status(&format!("Error: {:#}", e)),
            }
        }
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    tui: &mut Tui,
    store: &mut dyn RegionStore,
    dir: &Path,
) -> Result<()> {
    while tui.app.running {
        tui.app.tick();
        tui.handle_effects();
        if tui.app.has_pending_writes() {
            tui.app.flush(store);
        }
        tui.sync_frame();

        let mut canvas = None;
        terminal.draw(|f| canvas = ui::draw(f, tui))?;
        tui.canvas = canvas;

        if !event::poll(tui.poll_timeout())? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Clear status on any key
                tui.app.clear_status();
                handle_key(tui, key.code);
            }
            Event::Mouse(mouse) => handle_mouse(tui, mouse),
            _ => {}
        }
        if let Some(request) = tui.request.take() {
            handle_request(tui, store, dir, request);
        }
        tui.handle_effects();
    }
    Ok(())
}

fn handle_mouse(tui: &mut Tui, mouse: MouseEvent) {
    if tui.prompt.is_some() {
        return;
    }
    let Some(canvas) = tui.canvas else {
        return;
    };
    let point = canvas.to_image(mouse.column, mouse.row);

    let event = match (mouse.kind, point) {
        (MouseEventKind::Down(MouseButton::Left), Some(p)) => PointerEvent::Press(p),
        (MouseEventKind::Drag(MouseButton::Left), Some(p)) => PointerEvent::Move(p),
        (MouseEventKind::Up(MouseButton::Left), Some(p)) => PointerEvent::Release(p),
        // Leaving the image cancels the press
        (MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Up(MouseButton::Left), None) => {
            PointerEvent::Cancel
        }
        _ => return,
    };
    tui.app.pointer(event);
}

fn handle_key(tui: &mut Tui, code: KeyCode) {
    match tui.prompt.take() {
        None => handle_normal_keys(tui, code),
        Some(Prompt::Help) => {}
        Some(prompt) => tui.prompt = handle_prompt(tui, prompt, code),
    }
}

fn handle_normal_keys(tui: &mut Tui, code: KeyCode) {
    let app = &mut tui.app;
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('?') => tui.prompt = Some(Prompt::Help),
        KeyCode::Char('o') => tui.request = Some(Request::ListExercises),

        // Modes
        KeyCode::Char('e') | KeyCode::Char('1') => app.set_mode(Mode::Edit),
        KeyCode::Char('p') | KeyCode::Char('2') => app.set_mode(Mode::Practice),
        KeyCode::Char('d') | KeyCode::Char('3') => {
            if app.exercise().is_some() {
                tui.prompt = Some(Prompt::ContentPicker { selected: 0 });
            }
        }

        // Radius of new regions
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let radius = app.increase_radius();
            app.set_status(&format!("Radius {radius}"));
        }
        KeyCode::Char('-') => {
            let radius = app.decrease_radius();
            app.set_status(&format!("Radius {radius}"));
        }

        KeyCode::Char('s') => match app.stop_quiz() {
            Ok(summary) => app.set_status(&format!(
                "Quiz stopped: {}/{} correct",
                summary.correct, summary.total
            )),
            Err(e) => app.set_status(&e.to_string()),
        },
        KeyCode::Char('r') => {
            let queued = app.retry_failed_saves();
            app.set_status(&format!("Retrying {queued} region(s)"));
        }
        KeyCode::Esc => app.close_reveal(),
        _ => {}
    }
}

/// Handle a key in a prompt; returns the prompt to keep open, if any
fn handle_prompt(tui: &mut Tui, prompt: Prompt, code: KeyCode) -> Option<Prompt> {
    let app = &mut tui.app;
    match prompt {
        Prompt::TextEditor {
            region,
            mut label,
            mut text,
            mut field,
        } => {
            let input = match field {
                Field::Label => &mut label,
                Field::Text => &mut text,
            };
            match code {
                KeyCode::Esc => return None,
                KeyCode::Enter => {
                    if let Err(e) = app.save_text(region, &label, &text) {
                        app.set_status(&format!("Error: {e}"));
                    } else {
                        app.set_status("Text saved");
                    }
                    return None;
                }
                KeyCode::Tab => {
                    field = match field {
                        Field::Label => Field::Text,
                        Field::Text => Field::Label,
                    };
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            Some(Prompt::TextEditor {
                region,
                label,
                text,
                field,
            })
        }
        Prompt::AudioEditor { region, mut path } => match code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                let path = path.trim();
                let audio = (!path.is_empty()).then(|| AudioRef::new(path));
                match app.save_audio(region, audio) {
                    Ok(()) => app.set_status("Audio saved"),
                    Err(e) => app.set_status(&format!("Error: {e}")),
                }
                None
            }
            KeyCode::Backspace => {
                path.pop();
                Some(Prompt::AudioEditor { region, path })
            }
            KeyCode::Char(c) => {
                path.push(c);
                Some(Prompt::AudioEditor { region, path })
            }
            _ => Some(Prompt::AudioEditor { region, path }),
        },
        Prompt::ConfirmDelete { region, label } => match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                if app.confirm_delete(region) {
                    app.set_status(&format!("Deleted {label}"));
                }
                None
            }
            KeyCode::Char('n') | KeyCode::Esc => None,
            _ => Some(Prompt::ConfirmDelete { region, label }),
        },
        Prompt::ContentPicker { selected } => {
            let total = ContentMode::all().len();
            match code {
                KeyCode::Esc => None,
                KeyCode::Char('j') | KeyCode::Down => Some(Prompt::ContentPicker {
                    selected: (selected + 1) % total,
                }),
                KeyCode::Char('k') | KeyCode::Up => Some(Prompt::ContentPicker {
                    selected: if selected == 0 { total - 1 } else { selected - 1 },
                }),
                KeyCode::Enter => Some(task_count_prompt(app, ContentMode::all()[selected])),
                // Quick select
                KeyCode::Char(c @ '1'..='3') => {
                    let index = c as usize - '1' as usize;
                    Some(task_count_prompt(app, ContentMode::all()[index]))
                }
                _ => Some(Prompt::ContentPicker { selected }),
            }
        }
        Prompt::TaskCount { mode, mut input } => match code {
            KeyCode::Esc => None,
            KeyCode::Enter => {
                let Ok(count) = input.trim().parse::<usize>() else {
                    app.set_status("Enter a number of tasks");
                    return Some(Prompt::TaskCount { mode, input });
                };
                match app.start_quiz(mode, count) {
                    Ok(()) => {
                        app.set_status(&format!("Quiz started: {count} tasks"));
                        None
                    }
                    Err(e) => {
                        app.set_status(&format!("Error: {e}"));
                        Some(Prompt::TaskCount { mode, input })
                    }
                }
            }
            KeyCode::Backspace => {
                input.pop();
                Some(Prompt::TaskCount { mode, input })
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                input.push(c);
                Some(Prompt::TaskCount { mode, input })
            }
            _ => Some(Prompt::TaskCount { mode, input }),
        },
        Prompt::ExerciseList {
            exercises,
            selected,
        } => {
            let total = exercises.len();
            match code {
                KeyCode::Esc => None,
                KeyCode::Char('j') | KeyCode::Down => Some(Prompt::ExerciseList {
                    exercises,
                    selected: (selected + 1) % total,
                }),
                KeyCode::Char('k') | KeyCode::Up => Some(Prompt::ExerciseList {
                    exercises,
                    selected: if selected == 0 { total - 1 } else { selected - 1 },
                }),
                KeyCode::Enter => {
                    tui.request = exercises.into_iter().nth(selected).map(Request::Open);
                    None
                }
                _ => Some(Prompt::ExerciseList {
                    exercises,
                    selected,
                }),
            }
        }
        Prompt::Help => None,
    }
}

fn task_count_prompt(app: &App, mode: ContentMode) -> Prompt {
    Prompt::TaskCount {
        mode,
        input: app.settings().quiz.default_task_count.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotklick_core::{ManualClock, MemoryStore, RegionIndex, Settings};
    use tempfile::tempdir;

    fn tui() -> (Tui, ManualClock) {
        let clock = ManualClock::new();
        let mut app = App::with_clock(Settings::default(), Box::new(clock.clone()), 3);
        let exercise = Exercise::new("Eye".to_string(), "eye.png".to_string(), 200, 100);
        app.open_exercise(exercise, Vec::new());
        let mut tui = Tui::new(app);
        tui.canvas = Some(CanvasArea {
            rect: Rect::new(0, 0, 200, 50),
            image_width: 200,
            image_height: 100,
        });
        (tui, clock)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: crossterm::event::KeyModifiers::NONE,
        }
    }

    fn hold(tui: &mut Tui, clock: &ManualClock, column: u16, row: u16) {
        handle_mouse(tui, mouse(MouseEventKind::Down(MouseButton::Left), column, row));
        clock.advance_ms(500);
        tui.app.tick();
        handle_mouse(tui, mouse(MouseEventKind::Up(MouseButton::Left), column, row));
        tui.handle_effects();
    }

    fn type_str(tui: &mut Tui, s: &str) {
        for c in s.chars() {
            handle_key(tui, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_args() {
        let args = |v: &[&str]| Args::parse(v.iter().map(|s| s.to_string()));
        assert_eq!(
            args(&["--debug", "cell.png", "--name", "Cell"]).unwrap(),
            Args {
                image: Some("cell.png".to_string()),
                name: Some("Cell".to_string()),
                debug: true,
            }
        );
        assert!(args(&["--name"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }

    #[test]
    fn test_hold_creates_region_and_pulses() {
        let (mut tui, clock) = tui();
        handle_key(&mut tui, KeyCode::Char('e'));
        hold(&mut tui, &clock, 50, 10);

        assert_eq!(tui.app.index().len(), 1);
        let center = tui.app.index().regions()[0].center;
        assert_eq!((center.x, center.y), (51.0, 21.0));
        assert!(tui.pulse_ring().is_some());

        clock.advance_ms(400);
        tui.sync_frame();
        assert!(tui.pulse_ring().is_none());
        assert!(tui.frame.show_regions);
    }

    #[test]
    fn test_text_editor_saves_label_and_text() {
        let (mut tui, clock) = tui();
        handle_key(&mut tui, KeyCode::Char('e'));
        hold(&mut tui, &clock, 50, 10);
        let id = tui.app.index().regions()[0].id;

        // Hold on the region opens the audio editor
        hold(&mut tui, &clock, 50, 10);
        assert!(matches!(tui.prompt, Some(Prompt::AudioEditor { .. })));
        type_str(&mut tui, "iris.ogg");
        handle_key(&mut tui, KeyCode::Enter);
        assert!(tui.prompt.is_none());
        assert_eq!(tui.app.index().get(id).unwrap().audio(), Some(&AudioRef::new("iris.ogg")));

        tui.prompt = Some(Prompt::TextEditor {
            region: id,
            label: "A1".to_string(),
            text: String::new(),
            field: Field::Text,
        });
        type_str(&mut tui, "Iris");
        handle_key(&mut tui, KeyCode::Tab);
        handle_key(&mut tui, KeyCode::Backspace);
        handle_key(&mut tui, KeyCode::Backspace);
        type_str(&mut tui, "I1");
        handle_key(&mut tui, KeyCode::Enter);

        let region = tui.app.index().get(id).unwrap();
        assert_eq!(region.label(), "I1");
        assert_eq!(region.text(), Some("Iris"));
    }

    #[test]
    fn test_click_region_asks_before_delete() {
        let (mut tui, clock) = tui();
        handle_key(&mut tui, KeyCode::Char('e'));
        hold(&mut tui, &clock, 50, 10);

        handle_mouse(&mut tui, mouse(MouseEventKind::Down(MouseButton::Left), 50, 10));
        clock.advance_ms(50);
        handle_mouse(&mut tui, mouse(MouseEventKind::Up(MouseButton::Left), 50, 10));
        clock.advance_ms(300);
        tui.app.tick();
        tui.handle_effects();
        assert!(matches!(tui.prompt, Some(Prompt::ConfirmDelete { .. })));

        handle_key(&mut tui, KeyCode::Char('n'));
        assert_eq!(tui.app.index().len(), 1);

        tui.prompt = Some(Prompt::ConfirmDelete {
            region: tui.app.index().regions()[0].id,
            label: "A1".to_string(),
        });
        handle_key(&mut tui, KeyCode::Char('y'));
        assert!(tui.app.index().is_empty());
    }

    #[test]
    fn test_quiz_prompts() {
        let (mut tui, clock) = tui();
        handle_key(&mut tui, KeyCode::Char('e'));
        hold(&mut tui, &clock, 50, 10);
        let id = tui.app.index().regions()[0].id;
        tui.app.save_text(id, "", "Pupil").unwrap();

        handle_key(&mut tui, KeyCode::Char('d'));
        handle_key(&mut tui, KeyCode::Char('2'));
        // Audio-only quiz has no candidates and stays open
        handle_key(&mut tui, KeyCode::Enter);
        assert!(matches!(tui.prompt, Some(Prompt::TaskCount { .. })));
        assert_eq!(tui.app.mode(), Mode::Edit);

        tui.prompt = Some(Prompt::ContentPicker { selected: 0 });
        handle_key(&mut tui, KeyCode::Enter);
        handle_key(&mut tui, KeyCode::Backspace);
        handle_key(&mut tui, KeyCode::Backspace);
        type_str(&mut tui, "x4");
        handle_key(&mut tui, KeyCode::Enter);

        assert!(tui.prompt.is_none());
        assert_eq!(tui.app.mode(), Mode::Deepening);
        assert_eq!(tui.app.quiz().unwrap().tasks().len(), 4);
        assert_eq!(tui.app.current_task().unwrap().text.as_deref(), Some("Pupil"));
    }

    #[test]
    fn test_mouse_ignored_under_prompt_and_outside_canvas() {
        let (mut tui, _clock) = tui();
        tui.prompt = Some(Prompt::Help);
        handle_mouse(&mut tui, mouse(MouseEventKind::Down(MouseButton::Left), 5, 5));
        assert_eq!(tui.app.next_deadline(), None);

        handle_key(&mut tui, KeyCode::Char('x'));
        assert!(tui.prompt.is_none());
        handle_mouse(&mut tui, mouse(MouseEventKind::Down(MouseButton::Left), 250, 5));
        assert_eq!(tui.app.next_deadline(), None);
    }

    #[test]
    fn test_exercise_list_opens_selected_exercise() {
        let dir = tempdir().unwrap();
        let mut older = Exercise::new("Skull".to_string(), "skull.png".to_string(), 300, 200);
        older.created_at -= chrono::Duration::minutes(5);
        let newer = Exercise::new("Hand".to_string(), "hand.png".to_string(), 120, 80);
        io::save_exercises(dir.path(), &[older.clone(), newer.clone()]).unwrap();

        let mut idx = RegionIndex::new(older.id, Settings::default().radius);
        idx.create(Point::new(40.0, 40.0), 20, None).unwrap();
        let mut store = MemoryStore::with_regions(idx.regions().to_vec());

        let app = App::with_clock(Settings::default(), Box::new(ManualClock::new()), 1);
        let mut tui = Tui::new(app);
        handle_request(&mut tui, &mut store, dir.path(), Request::ListExercises);
        match &tui.prompt {
            Some(Prompt::ExerciseList { exercises, selected }) => {
                assert_eq!(*selected, 0);
                let ids: Vec<_> = exercises.iter().map(|e| e.id).collect();
                assert_eq!(ids, vec![newer.id, older.id]);
            }
            other => panic!("expected exercise list, got {other:?}"),
        }

        handle_key(&mut tui, KeyCode::Char('j'));
        handle_key(&mut tui, KeyCode::Enter);
        assert!(tui.prompt.is_none());
        let request = tui.request.take().unwrap();
        assert!(matches!(&request, Request::Open(e) if e.id == older.id));

        // The image file is missing, so only the preview is skipped
        handle_request(&mut tui, &mut store, dir.path(), request);
        assert_eq!(tui.app.exercise().unwrap().id, older.id);
        assert_eq!(tui.app.index().len(), 1);
        assert!(tui.preview.is_none());
        assert_eq!(tui.app.status_message.as_deref(), Some("Loaded Skull"));
    }

    #[test]
    fn test_exercise_list_without_exercises() {
        let dir = tempdir().unwrap();
        let (mut tui, _clock) = tui();
        handle_key(&mut tui, KeyCode::Char('o'));
        assert_eq!(tui.request, Some(Request::ListExercises));

        let request = tui.request.take().unwrap();
        handle_request(&mut tui, &mut MemoryStore::new(), dir.path(), request);
        assert!(tui.prompt.is_none());
        assert!(tui.app.status_message.is_some());

        tui.prompt = Prompt::exercise_list(Vec::new());
        assert!(tui.prompt.is_none());
    }
}
