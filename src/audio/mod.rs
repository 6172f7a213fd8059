use crate::model::StreamInfo;
use anyhow::{Context, Result};
use rodio::Source;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::time::Instant;

const MAX_VOLUME: f32 = 1.0;

/// Boundary to the external playback engine. Decoding and rendering live
/// behind this trait; the session never inspects encoded media.
pub trait AudioEngine {
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_paused(&self) -> bool;
    fn current_track(&self) -> Option<&Path>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn stream_info(&self) -> Option<StreamInfo>;
    fn is_finished(&self) -> bool;
}

pub struct RodioAudioEngine {
    stream: OutputStream,
    sink: Sink,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
    stream_info: Option<StreamInfo>,
    volume: f32,
}

impl RodioAudioEngine {
    pub fn new() -> Result<Self> {
        let (stream, sink) = Self::open_output_stream()?;

        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
            stream_info: None,
            volume: 1.0,
        })
    }

    fn open_output_stream() -> Result<(OutputStream, Sink)> {
        let mut stream = with_silenced_stderr(|| {
            OutputStreamBuilder::from_default_device()
                .context("failed to open default system output stream")
                .and_then(|builder| {
                    builder
                        .with_error_callback(|_| {})
                        .open_stream_or_fallback()
                        .context("failed to start default output stream")
                })
        })?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());
        Ok((stream, sink))
    }
}

impl AudioEngine for RodioAudioEngine {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());

        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;

        let channels: u16 = source.channels().into();
        let sample_rate = source.sample_rate();
        let duration = source.total_duration().filter(|total| !total.is_zero());
        self.stream_info = Some(StreamInfo {
            sample_rate_hz: Some(sample_rate),
            channels: Some(channels),
            bitrate_kbps: estimate_bitrate_kbps(path, duration),
        });
        self.track_duration = duration;

        self.sink.append(source);
        self.sink.set_volume(self.volume);
        self.current = Some(path.to_path_buf());
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.current = None;
        self.track_duration = None;
        self.stream_info = None;
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        let target = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.sink
            .try_seek(target)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))?;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
        self.sink.set_volume(self.volume);
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.stream_info
    }

    fn is_finished(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

/// Average bitrate from container size over decoded duration. Streams with
/// unknown duration report no bitrate and the UI shows a placeholder.
fn estimate_bitrate_kbps(path: &Path, duration: Option<Duration>) -> Option<u32> {
    let duration = duration?;
    let secs = duration.as_secs_f64();
    if secs <= 0.0 {
        return None;
    }
    let bytes = std::fs::metadata(path).ok()?.len();
    let kbps = (bytes as f64 * 8.0 / 1000.0 / secs).round();
    if kbps < 1.0 { None } else { Some(kbps as u32) }
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

/// Clock-driven stand-in used when no output device exists and in tests.
pub struct NullAudioEngine {
    paused: bool,
    current: Option<PathBuf>,
    volume: f32,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
    stream_info: Option<StreamInfo>,
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self {
            paused: false,
            current: None,
            volume: 1.0,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
            stream_info: None,
        }
    }

    fn probe(path: &Path) -> (Option<Duration>, Option<StreamInfo>) {
        let Ok(file) = File::open(path) else {
            return (None, None);
        };
        let Ok(source) = Decoder::try_from(file) else {
            return (None, None);
        };
        let channels: u16 = source.channels().into();
        let duration = source.total_duration().filter(|total| !total.is_zero());
        let info = StreamInfo {
            sample_rate_hz: Some(source.sample_rate()),
            channels: Some(channels),
            bitrate_kbps: estimate_bitrate_kbps(path, duration),
        };
        (duration, Some(info))
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }
}

impl Default for NullAudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for NullAudioEngine {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.paused = false;
        self.current = Some(path.to_path_buf());
        self.started_at = Some(Instant::now());
        self.position_offset = Duration::ZERO;
        let (duration, info) = Self::probe(path);
        self.track_duration = duration;
        self.stream_info = info;
        Ok(())
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn resume(&mut self) {
        if self.current.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.paused = false;
    }

    fn stop(&mut self) {
        self.current = None;
        self.paused = false;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = None;
        self.stream_info = None;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, MAX_VOLUME);
    }

    fn stream_info(&self) -> Option<StreamInfo> {
        self.stream_info
    }

    fn is_finished(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.current.is_some() && !self.paused && self.current_position() >= duration
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioEngine, NullAudioEngine};
    use std::fs;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    fn write_test_wav(path: &Path, duration_ms: u32) {
        let sample_rate: u32 = 44_100;
        let channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let bytes_per_sample = u32::from(bits_per_sample / 8);
        let total_samples = (u64::from(sample_rate) * u64::from(duration_ms) / 1_000) as u32;
        let data_size = total_samples * u32::from(channels) * bytes_per_sample;
        let byte_rate = sample_rate * u32::from(channels) * bytes_per_sample;
        let block_align = channels * (bits_per_sample / 8);
        let riff_chunk_size = 36_u32.saturating_add(data_size);

        let mut bytes = Vec::with_capacity((44_u32 + data_size) as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&riff_chunk_size.to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16_u32.to_le_bytes());
        bytes.extend_from_slice(&1_u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&byte_rate.to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&bits_per_sample.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_size.to_le_bytes());
        bytes.resize((44_u32 + data_size) as usize, 0_u8);

        fs::write(path, bytes).expect("wav fixture should be written");
    }

    #[test]
    fn null_engine_position_advances_when_playing() {
        let mut engine = NullAudioEngine::new();
        engine
            .play(Path::new("nonexistent-track.flac"))
            .expect("play should still work in null mode");
        let before = engine.position().expect("position should be present");
        thread::sleep(Duration::from_millis(20));
        let after = engine.position().expect("position should be present");
        assert!(after > before, "position should advance while playing");
    }

    #[test]
    fn null_engine_pause_and_resume_control_position_progression() {
        let mut engine = NullAudioEngine::new();
        engine
            .play(Path::new("nonexistent-track.flac"))
            .expect("play should still work in null mode");
        thread::sleep(Duration::from_millis(20));

        engine.pause();
        let paused = engine.position().expect("position should be present");
        thread::sleep(Duration::from_millis(20));
        let paused_later = engine.position().expect("position should be present");
        assert_eq!(paused_later, paused, "position should freeze while paused");

        engine.resume();
        thread::sleep(Duration::from_millis(20));
        let resumed = engine.position().expect("position should be present");
        assert!(resumed > paused, "position should continue after resume");
    }

    #[test]
    fn null_engine_seek_updates_position() {
        let mut engine = NullAudioEngine::new();
        engine
            .play(Path::new("nonexistent-track.flac"))
            .expect("play should still work in null mode");

        let target = Duration::from_secs(12);
        engine.seek_to(target).expect("seek should succeed");
        let position = engine.position().expect("position should be present");
        assert!(position >= target, "seek should move logical position");
    }

    #[test]
    fn null_engine_finishes_when_known_duration_elapses() {
        let dir = tempfile::tempdir().expect("tempdir");
        let track = dir.path().join("fixture.wav");
        write_test_wav(&track, 80);

        let mut engine = NullAudioEngine::new();
        engine
            .play(&track)
            .expect("play should succeed for wav fixture");
        let duration = engine.duration().expect("duration should be detected");
        assert!(duration >= Duration::from_millis(70));

        thread::sleep(Duration::from_millis(120));
        assert!(
            engine.is_finished(),
            "known-duration playback should finish"
        );
    }

    #[test]
    fn null_engine_unknown_duration_does_not_auto_finish() {
        let mut engine = NullAudioEngine::new();
        engine
            .play(Path::new("nonexistent-track.flac"))
            .expect("play should still work in null mode");
        assert_eq!(engine.duration(), None);

        thread::sleep(Duration::from_millis(80));
        assert!(
            !engine.is_finished(),
            "unknown-duration playback should remain active"
        );
    }

    #[test]
    fn null_engine_reports_stream_facts_for_decodable_tracks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let track = dir.path().join("facts.wav");
        write_test_wav(&track, 500);

        let mut engine = NullAudioEngine::new();
        engine
            .play(&track)
            .expect("play should succeed for wav fixture");

        let info = engine.stream_info().expect("stream facts should be probed");
        assert_eq!(info.sample_rate_hz, Some(44_100));
        assert_eq!(info.channels, Some(1));
        let kbps = info.bitrate_kbps.expect("bitrate estimate");
        // 44.1 kHz mono 16-bit PCM is ~706 kbps; allow container slack.
        assert!((600..=900).contains(&kbps), "estimated {kbps} kbps");
    }

    #[test]
    fn null_engine_swallows_metadata_failures() {
        let mut engine = NullAudioEngine::new();
        engine
            .play(Path::new("nonexistent-track.flac"))
            .expect("play should still work in null mode");
        assert_eq!(engine.stream_info(), None);
    }

    #[test]
    fn null_engine_stop_clears_stream_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let track = dir.path().join("stop.wav");
        write_test_wav(&track, 100);

        let mut engine = NullAudioEngine::new();
        engine.play(&track).expect("play");
        engine.stop();

        assert_eq!(engine.current_track(), None);
        assert_eq!(engine.position(), None);
        assert_eq!(engine.stream_info(), None);
        assert!(!engine.is_finished());
    }

    #[test]
    fn volume_is_clamped_to_unit_range() {
        let mut engine = NullAudioEngine::new();
        engine.set_volume(3.0);
        assert_eq!(engine.volume(), 1.0);
        engine.set_volume(-0.5);
        assert_eq!(engine.volume(), 0.0);
    }
}
