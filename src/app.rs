use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::config;
use crate::model::{Settings, Track};
use crate::picker::{FilePicker, PickerAction};
use crate::session::{PlayerSession, TrackEnd};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::env;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Default)]
pub struct AppStartupOptions {
    pub no_audio: bool,
    pub start_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Catalog,
    Picker,
}

/// The 1-second display refresh while something is playing. Started on
/// play/resume, stopped on pause/stop/quit so no cadence outlives playback.
#[derive(Debug, Default)]
pub struct ProgressPoll {
    next_due: Option<Instant>,
}

impl ProgressPoll {
    pub fn start(&mut self) {
        if self.next_due.is_none() {
            self.next_due = Some(Instant::now() + PROGRESS_INTERVAL);
        }
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// True once per elapsed interval while active.
    pub fn due(&mut self) -> bool {
        match self.next_due {
            Some(at) if Instant::now() >= at => {
                self.next_due = Some(Instant::now() + PROGRESS_INTERVAL);
                true
            }
            _ => false,
        }
    }
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let settings = config::load_settings()?;
    let mut session = PlayerSession::new(settings.repeat_mode);

    let mut audio: Box<dyn AudioEngine> = if options.no_audio {
        Box::new(NullAudioEngine::new())
    } else {
        match RodioAudioEngine::new() {
            Ok(engine) => Box::new(engine),
            Err(_) => Box::new(NullAudioEngine::new()),
        }
    };
    audio.set_volume(settings.saved_volume);

    let start_dir = options
        .start_dir
        .or_else(|| settings.start_dir.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let mut picker = FilePicker::new(start_dir);
    let seek_step = Duration::from_secs(u64::from(settings.seek_step_secs.max(1)));

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut focus = Focus::Picker;
    let mut progress = ProgressPoll::default();

    let result: Result<()> = loop {
        advance_after_track_end(&mut session, &mut *audio, &mut progress);

        if session.dirty || progress.due() {
            terminal.draw(|frame| crate::ui::draw(frame, &session, &picker, &*audio, focus))?;
            session.dirty = false;
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Char('q') => break Ok(()),
            KeyCode::Tab => {
                focus = match focus {
                    Focus::Catalog => Focus::Picker,
                    Focus::Picker => Focus::Catalog,
                };
                session.dirty = true;
            }
            KeyCode::Down => match focus {
                Focus::Catalog => session.select_next(),
                Focus::Picker => {
                    picker.select_next();
                    session.dirty = true;
                }
            },
            KeyCode::Up => match focus {
                Focus::Catalog => session.select_previous(),
                Focus::Picker => {
                    picker.select_previous();
                    session.dirty = true;
                }
            },
            KeyCode::Enter => match focus {
                Focus::Picker => match picker.activate_selected() {
                    PickerAction::Picked(path) => {
                        append_picked(&mut session, &mut *audio, path);
                    }
                    PickerAction::Navigated | PickerAction::Nothing => session.dirty = true,
                },
                Focus::Catalog => {
                    let index = session.selected_track;
                    if session.set_current(index).is_ok() {
                        play_current(&mut session, &mut *audio, &mut progress);
                    }
                }
            },
            KeyCode::Char('a') if focus == Focus::Picker => {
                let files = picker.audio_files();
                if files.is_empty() {
                    session.set_status("No audio files here");
                } else {
                    let count = files.len();
                    for path in files {
                        append_picked(&mut session, &mut *audio, path);
                    }
                    session.set_status(&format!("Added {count} tracks"));
                }
            }
            KeyCode::Char(' ') => toggle_play_pause(&mut session, &mut *audio, &mut progress),
            KeyCode::Char('x') => {
                audio.stop();
                progress.stop();
                session.set_status("Stopped");
            }
            KeyCode::Char('n') => {
                if session.advance_next().is_some() {
                    play_current(&mut session, &mut *audio, &mut progress);
                }
            }
            KeyCode::Char('p') => {
                if session.advance_previous().is_some() {
                    play_current(&mut session, &mut *audio, &mut progress);
                }
            }
            KeyCode::Left => seek_relative(&mut session, &mut *audio, seek_step, false),
            KeyCode::Right => seek_relative(&mut session, &mut *audio, seek_step, true),
            KeyCode::Char(digit) if digit.is_ascii_digit() => {
                let tenths = u32::from(digit) - u32::from('0');
                seek_absolute(&mut session, &mut *audio, tenths * 10);
            }
            KeyCode::Char('z') => session.toggle_shuffle(),
            KeyCode::Char('r') => session.toggle_repeat(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (audio.volume() + VOLUME_STEP).clamp(0.0, 1.0);
                audio.set_volume(next);
                session.set_status(&format!("Volume: {}%", (next * 100.0).round() as u16));
            }
            KeyCode::Char('-') => {
                let next = (audio.volume() - VOLUME_STEP).clamp(0.0, 1.0);
                audio.set_volume(next);
                session.set_status(&format!("Volume: {}%", (next * 100.0).round() as u16));
            }
            _ => {}
        }
    };

    progress.stop();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let save_result = config::save_settings(&Settings {
        repeat_mode: session.repeat_mode(),
        saved_volume: audio.volume(),
        seek_step_secs: settings.seek_step_secs,
        start_dir: Some(picker.current_dir().to_path_buf()),
    });
    result?;
    save_result?;
    Ok(())
}

/// Appends a picked file. The first track of the session is loaded into the
/// engine immediately, paused, so play starts it without re-selection.
fn append_picked(session: &mut PlayerSession, audio: &mut dyn AudioEngine, path: PathBuf) {
    let was_empty = session.is_empty();
    session.append_track(Track::from_path(path));

    if was_empty
        && let Some(track) = session.current_track()
    {
        let path = track.path.clone();
        if let Err(err) = audio.play(&path) {
            session.set_status(&format!("playback error: {err:#}"));
            return;
        }
        audio.pause();
    }
}

fn play_current(
    session: &mut PlayerSession,
    audio: &mut dyn AudioEngine,
    progress: &mut ProgressPoll,
) {
    let Some(track) = session.current_track() else {
        session.set_status("No tracks loaded");
        return;
    };

    let path = track.path.clone();
    let name = track.display_name.clone();
    match audio.play(&path) {
        Ok(()) => {
            progress.start();
            session.set_status(&format!("Playing {name}"));
        }
        Err(err) => {
            progress.stop();
            session.set_status(&format!("playback error: {err:#}"));
        }
    }
}

fn toggle_play_pause(
    session: &mut PlayerSession,
    audio: &mut dyn AudioEngine,
    progress: &mut ProgressPoll,
) {
    if audio.current_track().is_none() {
        // Stopped (or never started): restart the current catalog entry.
        play_current(session, audio, progress);
        return;
    }

    if audio.is_paused() {
        audio.resume();
        progress.start();
        session.set_status("Resumed");
    } else {
        audio.pause();
        progress.stop();
        session.set_status("Paused");
    }
}

fn seek_relative(
    session: &mut PlayerSession,
    audio: &mut dyn AudioEngine,
    step: Duration,
    forward: bool,
) {
    let Some(position) = audio.position() else {
        return;
    };

    let target = if forward {
        let target = position.saturating_add(step);
        audio.duration().map_or(target, |total| target.min(total))
    } else {
        position.saturating_sub(step)
    };

    if let Err(err) = audio.seek_to(target) {
        session.set_status(&format!("seek error: {err:#}"));
    } else {
        session.dirty = true;
    }
}

fn seek_absolute(session: &mut PlayerSession, audio: &mut dyn AudioEngine, percent: u32) {
    let Some(total) = audio.duration() else {
        return;
    };

    let target = total.mul_f64(f64::from(percent.min(100)) / 100.0);
    if let Err(err) = audio.seek_to(target) {
        session.set_status(&format!("seek error: {err:#}"));
    } else {
        session.dirty = true;
    }
}

/// Polled end-of-media transition: asks the session what the repeat mode
/// dictates and drives the engine accordingly.
fn advance_after_track_end(
    session: &mut PlayerSession,
    audio: &mut dyn AudioEngine,
    progress: &mut ProgressPoll,
) {
    if audio.current_track().is_none() || audio.is_paused() || !audio.is_finished() {
        return;
    }

    match session.track_ended() {
        TrackEnd::Restart => {
            // A drained sink cannot seek; reload the same track from zero.
            play_current(session, audio, progress);
        }
        TrackEnd::Advance(_) => {
            play_current(session, audio, progress);
        }
        TrackEnd::Stop => {
            audio.stop();
            progress.stop();
            session.dirty = true;
        }
    }
}
