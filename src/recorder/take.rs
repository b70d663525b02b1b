use crate::wav::WavFile;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Mono 16-bit samples captured so far, in arrival order.
#[derive(Debug, Clone)]
pub struct Take {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl Default for Take {
    fn default() -> Self {
        Take::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Take {
    pub fn new(sample_rate: u32) -> Self {
        Take {
            sample_rate,
            samples: Vec::new(),
        }
    }

    pub fn append(&mut self, block: &[i16]) {
        self.samples.extend_from_slice(block);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn to_wav(&self) -> WavFile {
        let mut wav = WavFile::new(self.sample_rate, 1);
        wav.from_i16_samples(&self.samples);
        wav
    }
}
