pub mod capture;
pub mod level;
pub mod stopwatch;
pub mod take;

use capture::{capture_pipeline, ActiveInput, CaptureWorker, InputSource};
use level::LevelMeter;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};
use std::time::Duration;
use stopwatch::Stopwatch;
use strum::{Display, EnumIter};
use take::Take;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecorderState {
    #[strum(serialize = "idle")]
    Idle,
    #[strum(serialize = "recording")]
    Recording,
    #[strum(serialize = "paused")]
    Paused,
}

/// The four controls of the recorder screen, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum RecorderAction {
    #[strum(serialize = "Start Recording")]
    Start,
    #[strum(serialize = "Pause / Resume")]
    PauseResume,
    #[strum(serialize = "Save Recording")]
    Save,
    #[strum(serialize = "Reset")]
    Reset,
}

impl RecorderAction {
    pub fn label(&self, state: RecorderState) -> String {
        match (self, state) {
            (RecorderAction::PauseResume, RecorderState::Paused) => "Resume".to_string(),
            (RecorderAction::PauseResume, _) => "Pause".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn is_enabled(&self, state: RecorderState) -> bool {
        match self {
            RecorderAction::Start => state == RecorderState::Idle,
            RecorderAction::PauseResume => state != RecorderState::Idle,
            RecorderAction::Save | RecorderAction::Reset => state == RecorderState::Paused,
        }
    }
}

/// Owns one take and the capture pipeline feeding it.
pub struct Recorder {
    state: RecorderState,
    take: Arc<Mutex<Take>>,
    source: Option<Box<dyn InputSource>>,
    input: Option<Box<dyn ActiveInput>>,
    worker: Option<CaptureWorker>,
    meter: LevelMeter,
    dropped: Arc<AtomicUsize>,
    stopwatch: Stopwatch,
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder {
            state: RecorderState::Idle,
            take: Arc::new(Mutex::new(Take::default())),
            source: None,
            input: None,
            worker: None,
            meter: LevelMeter::new(),
            dropped: Arc::new(AtomicUsize::new(0)),
            stopwatch: Stopwatch::new(),
        }
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_action_enabled(&self, action: RecorderAction) -> bool {
        action.is_enabled(self.state)
    }

    /// A resumed take keeps its source, so the input can only change between takes.
    pub fn can_change_input(&self) -> bool {
        self.state == RecorderState::Idle
    }

    /// Begin a fresh take from `source`.
    pub fn start(&mut self, source: Box<dyn InputSource>) -> Result<(), Box<dyn std::error::Error>> {
        if self.state != RecorderState::Idle {
            return Err("A recording is already in progress".into());
        }

        {
            let mut take = self.lock_take();
            take.clear();
            take.set_sample_rate(source.sample_rate());
        }
        self.stopwatch.reset();
        self.dropped.store(0, Ordering::Relaxed);
        self.source = Some(source);

        if let Err(e) = self.open_capture() {
            self.source = None;
            return Err(e);
        }

        self.stopwatch.start();
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Pause while recording, resume while paused. Returns the new state.
    pub fn toggle(&mut self) -> Result<RecorderState, Box<dyn std::error::Error>> {
        match self.state {
            RecorderState::Recording => {
                self.close_capture();
                self.stopwatch.pause();
                self.state = RecorderState::Paused;
            }
            RecorderState::Paused => {
                self.open_capture()?;
                self.stopwatch.start();
                self.state = RecorderState::Recording;
            }
            RecorderState::Idle => return Err("Nothing is being recorded".into()),
        }
        Ok(self.state)
    }

    /// Write the take as a mono 16-bit WAV. Returns the path actually written.
    pub fn save(&self, path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if self.state != RecorderState::Paused {
            return Err("Pause the recording before saving".into());
        }

        let path = with_wav_extension(path);
        let mut wav = self.lock_take().to_wav();
        wav.save_to_file(&path)?;
        Ok(path)
    }

    /// Drop the take and return to idle, stopping capture if needed.
    pub fn reset(&mut self) {
        self.close_capture();
        self.lock_take().clear();
        self.stopwatch.reset();
        self.dropped.store(0, Ordering::Relaxed);
        self.source = None;
        self.state = RecorderState::Idle;
    }

    /// Stop capturing before exit. The take is left intact.
    pub fn shutdown(&mut self) {
        if self.state == RecorderState::Recording {
            self.close_capture();
            self.stopwatch.pause();
            self.state = RecorderState::Paused;
        }
    }

    /// Samples the ring buffer had to drop since the last call, if any.
    pub fn poll(&mut self) -> Option<usize> {
        match self.dropped.swap(0, Ordering::Relaxed) {
            0 => None,
            n => Some(n),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed()
    }

    pub fn level(&self) -> u16 {
        self.meter.get()
    }

    pub fn level_ratio(&self) -> f64 {
        self.meter.ratio()
    }

    pub fn sample_count(&self) -> usize {
        self.lock_take().len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.lock_take().sample_rate()
    }

    pub fn duration_secs(&self) -> f64 {
        self.lock_take().duration_secs()
    }

    pub fn source_name(&self) -> Option<String> {
        self.source.as_ref().map(|s| s.name())
    }

    /// Copy of the captured samples so far.
    pub fn samples(&self) -> Vec<i16> {
        self.lock_take().samples().to_vec()
    }

    fn lock_take(&self) -> std::sync::MutexGuard<'_, Take> {
        self.take.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_capture(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let source = self.source.as_ref().ok_or("No input source selected")?;

        let (sink, worker) = capture_pipeline(
            source.sample_rate(),
            Arc::clone(&self.take),
            self.meter.clone(),
            Arc::clone(&self.dropped),
        );

        match source.open(sink) {
            Ok(input) => {
                self.input = Some(input);
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                worker.stop();
                Err(e)
            }
        }
    }

    fn close_capture(&mut self) {
        // Stop callbacks before the worker's final drain
        self.input = None;
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
        self.meter.clear();
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.close_capture();
    }
}

pub fn with_wav_extension(path: &Path) -> PathBuf {
    if path.extension().is_none() {
        path.with_extension("wav")
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::capture::BlockSink;
    use super::*;
    use std::cell::RefCell;
    use strum::IntoEnumIterator;

    /// Replays a queue of blocks, one batch per `open`.
    struct ScriptedInput {
        batches: RefCell<Vec<Vec<Vec<i16>>>>,
    }

    impl ScriptedInput {
        fn new(batches: Vec<Vec<Vec<i16>>>) -> Box<Self> {
            Box::new(ScriptedInput {
                batches: RefCell::new(batches),
            })
        }
    }

    impl InputSource for ScriptedInput {
        fn name(&self) -> String {
            "scripted".to_string()
        }

        fn sample_rate(&self) -> u32 {
            8000
        }

        fn open(&self, mut sink: BlockSink) -> Result<Box<dyn ActiveInput>, Box<dyn std::error::Error>> {
            let mut batches = self.batches.borrow_mut();
            if batches.is_empty() {
                return Err("device unplugged".into());
            }
            for block in batches.remove(0) {
                sink.push_block(&block);
            }
            Ok(Box::new(()))
        }
    }

    #[test]
    fn actions_follow_state() {
        let enabled = |state| {
            RecorderAction::iter()
                .filter(|a| a.is_enabled(state))
                .collect::<Vec<_>>()
        };

        assert_eq!(enabled(RecorderState::Idle), vec![RecorderAction::Start]);
        assert_eq!(
            enabled(RecorderState::Recording),
            vec![RecorderAction::PauseResume]
        );
        assert_eq!(
            enabled(RecorderState::Paused),
            vec![
                RecorderAction::PauseResume,
                RecorderAction::Save,
                RecorderAction::Reset
            ]
        );
    }

    #[test]
    fn toggle_label_tracks_state() {
        assert_eq!(RecorderAction::PauseResume.label(RecorderState::Recording), "Pause");
        assert_eq!(RecorderAction::PauseResume.label(RecorderState::Paused), "Resume");
        assert_eq!(RecorderAction::Start.label(RecorderState::Idle), "Start Recording");
    }

    #[test]
    fn pause_and_resume_append_to_the_same_take() {
        let mut recorder = Recorder::new();
        recorder
            .start(ScriptedInput::new(vec![
                vec![vec![1, 2], vec![3]],
                vec![vec![4, 5]],
            ]))
            .unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);
        assert_eq!(recorder.sample_rate(), 8000);

        assert_eq!(recorder.toggle().unwrap(), RecorderState::Paused);
        assert_eq!(recorder.samples(), vec![1, 2, 3]);
        assert_eq!(recorder.level(), 0);

        assert_eq!(recorder.toggle().unwrap(), RecorderState::Recording);
        recorder.toggle().unwrap();
        assert_eq!(recorder.samples(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn failed_resume_stays_paused() {
        let mut recorder = Recorder::new();
        recorder
            .start(ScriptedInput::new(vec![vec![vec![9]]]))
            .unwrap();
        recorder.toggle().unwrap();

        assert!(recorder.toggle().is_err());
        assert_eq!(recorder.state(), RecorderState::Paused);
        assert_eq!(recorder.samples(), vec![9]);
    }

    #[test]
    fn failed_start_stays_idle() {
        let mut recorder = Recorder::new();
        assert!(recorder.start(ScriptedInput::new(vec![])).is_err());
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(recorder.source_name().is_none());
    }

    #[test]
    fn state_violations_are_errors() {
        let mut recorder = Recorder::new();
        assert!(recorder.toggle().is_err());
        assert!(recorder.save(Path::new("never.wav")).is_err());

        recorder
            .start(ScriptedInput::new(vec![vec![vec![1]]]))
            .unwrap();
        assert!(recorder
            .start(ScriptedInput::new(vec![vec![vec![2]]]))
            .is_err());
        assert!(recorder.save(Path::new("never.wav")).is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let mut recorder = Recorder::new();
        recorder
            .start(ScriptedInput::new(vec![vec![vec![1, 2, 3]]]))
            .unwrap();
        recorder.reset();

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(recorder.sample_count(), 0);
        assert_eq!(recorder.elapsed(), Duration::ZERO);
        assert!(recorder.source_name().is_none());
    }

    #[test]
    fn shutdown_keeps_the_take() {
        let mut recorder = Recorder::new();
        recorder
            .start(ScriptedInput::new(vec![vec![vec![7, 8]]]))
            .unwrap();
        recorder.shutdown();

        assert_eq!(recorder.state(), RecorderState::Paused);
        assert_eq!(recorder.samples(), vec![7, 8]);
    }

    #[test]
    fn input_is_locked_while_a_take_is_open() {
        let mut recorder = Recorder::new();
        assert!(recorder.can_change_input());

        recorder
            .start(ScriptedInput::new(vec![vec![vec![1; 8000]]]))
            .unwrap();
        assert!(!recorder.can_change_input());
        recorder.toggle().unwrap();
        assert!(!recorder.can_change_input());
        assert!(recorder.is_action_enabled(RecorderAction::Save));
        assert_eq!(recorder.duration_secs(), 1.0);

        recorder.reset();
        assert!(recorder.can_change_input());
        assert!(recorder.is_action_enabled(RecorderAction::Start));
        assert!(!recorder.is_action_enabled(RecorderAction::Save));
    }

    #[test]
    fn ring_overflow_reaches_poll_once() {
        // 8 kHz source: the ring holds 16000 samples, nothing drains before the push
        let mut recorder = Recorder::new();
        recorder
            .start(ScriptedInput::new(vec![vec![vec![3; 16025]]]))
            .unwrap();

        assert_eq!(recorder.poll(), Some(25));
        assert_eq!(recorder.poll(), None);

        recorder.toggle().unwrap();
        assert_eq!(recorder.sample_count(), 16000);
    }

    #[test]
    fn reset_discards_unreported_overflow() {
        let mut recorder = Recorder::new();
        recorder
            .start(ScriptedInput::new(vec![vec![vec![3; 16100]]]))
            .unwrap();
        recorder.reset();
        assert_eq!(recorder.poll(), None);

        recorder
            .start(ScriptedInput::new(vec![vec![vec![4; 10]]]))
            .unwrap();
        assert_eq!(recorder.poll(), None);
    }

    #[test]
    fn wav_extension_is_added_only_when_missing() {
        assert_eq!(with_wav_extension(Path::new("take")), PathBuf::from("take.wav"));
        assert_eq!(with_wav_extension(Path::new("take.wav")), PathBuf::from("take.wav"));
        assert_eq!(with_wav_extension(Path::new("take.WAV")), PathBuf::from("take.WAV"));
    }
}
