use crate::device::AudioDevice;
use crate::recorder::take::DEFAULT_SAMPLE_RATE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input_device: Option<String>,
    pub sample_rate: u32,
    pub output_dir: PathBuf,
    pub file_name: String,
    pub theme: PathBuf,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            input_device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            output_dir: PathBuf::from("."),
            file_name: "recording.wav".to_string(),
            theme: PathBuf::from("theme.json"),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Read a config file, falling back to defaults when it is missing or malformed.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<AppConfig>(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Where a save-prompt answer ends up. Absolute names bypass `output_dir`.
    pub fn resolve_output(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_default()
        .join(CONFIG_FILE)
}

static AUDIO_ENGINE: OnceLock<Mutex<AudioEngine>> = OnceLock::new();

pub struct AudioEngine {
    input_devices: Vec<String>,
    selected_input: Option<String>,
    config: AppConfig,
}

impl AudioEngine {
    /// Lock the global engine, recovering from a poisoned lock.
    pub fn lock_global() -> MutexGuard<'static, AudioEngine> {
        AUDIO_ENGINE
            .get_or_init(|| Mutex::new(AudioEngine::new()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn new() -> Self {
        let input_devices = AudioDevice::list_inputs().unwrap_or_default();
        let config = AppConfig::load(&config_path());
        Self::with_config(input_devices, config)
    }

    pub fn with_config(input_devices: Vec<String>, config: AppConfig) -> Self {
        // Saved preference first, then the OS default, then whatever is listed first
        let selected_input = config
            .input_device
            .clone()
            .filter(|name| input_devices.contains(name))
            .or_else(AudioDevice::default_input_name)
            .filter(|name| input_devices.contains(name))
            .or_else(|| input_devices.first().cloned());

        AudioEngine {
            input_devices,
            selected_input,
            config,
        }
    }

    pub fn save_config(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.config.input_device = self.selected_input.clone();
        self.config.save(&config_path())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn input_devices(&self) -> &[String] {
        &self.input_devices
    }

    pub fn selected_input(&self) -> Option<&str> {
        self.selected_input.as_deref()
    }

    pub fn set_input_device(&mut self, name: String) {
        if self.input_devices.contains(&name) {
            self.selected_input = Some(name);
        }
    }

    pub fn refresh_devices(&mut self) {
        let devices = AudioDevice::list_inputs().unwrap_or_default();
        self.replace_devices(devices);
    }

    fn replace_devices(&mut self, devices: Vec<String>) {
        self.input_devices = devices;

        // Revalidate selection, fall back to OS default if current is gone
        let still_there = self
            .selected_input
            .as_ref()
            .is_some_and(|name| self.input_devices.contains(name));
        if !still_there {
            self.selected_input = AudioDevice::default_input_name()
                .filter(|name| self.input_devices.contains(name))
                .or_else(|| self.input_devices.first().cloned());
        }
    }

    /// Open the selected input (or the OS default) at the configured rate.
    pub fn get_input_device() -> Result<AudioDevice, Box<dyn std::error::Error>> {
        let (selected, rate) = {
            let engine = Self::lock_global();
            (engine.selected_input.clone(), engine.config.sample_rate)
        };

        match selected {
            Some(name) => AudioDevice::input_by_name(&name, rate),
            None => AudioDevice::default_input(rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "file_name": "memo.wav" }"#).unwrap();
        assert_eq!(config.file_name, "memo.wav");
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.theme, PathBuf::from("theme.json"));
        assert!(!config.debug);
    }

    #[test]
    fn load_falls_back_on_garbage() {
        let dir = std::env::temp_dir().join(format!("mic-recorder-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load(&path), AppConfig::default());

        assert_eq!(AppConfig::load(&dir.join("absent.json")), AppConfig::default());

        let mut config = AppConfig::default();
        config.input_device = Some("USB Mic".to_string());
        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn output_path_joins_relative_names_only() {
        let mut config = AppConfig::default();
        config.output_dir = PathBuf::from("/tmp/takes");
        assert_eq!(config.resolve_output("a.wav"), PathBuf::from("/tmp/takes/a.wav"));
        assert_eq!(config.resolve_output("/srv/b.wav"), PathBuf::from("/srv/b.wav"));
    }

    #[test]
    fn saved_device_wins_when_present() {
        let mut config = AppConfig::default();
        config.input_device = Some("Second".to_string());
        let engine = AudioEngine::with_config(vec!["First".into(), "Second".into()], config);
        assert_eq!(engine.selected_input(), Some("Second"));
    }

    #[test]
    fn unknown_device_is_never_selected() {
        let mut config = AppConfig::default();
        config.input_device = Some("Gone".to_string());
        let mut engine = AudioEngine::with_config(vec!["Only".into()], config);
        assert_eq!(engine.selected_input(), Some("Only"));

        engine.set_input_device("Gone".to_string());
        assert_eq!(engine.selected_input(), Some("Only"));

        engine.replace_devices(vec![]);
        assert_eq!(engine.selected_input(), None);
    }
}
