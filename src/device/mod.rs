use crate::recorder::capture::{ActiveInput, BlockSink, InputSource};
use crate::ui::debug_logger::DebugLogger;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    Device, FromSample, Host, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig,
    SupportedStreamConfig, SupportedStreamConfigRange,
};

impl ActiveInput for Stream {}

pub struct AudioDevice {
    pub name: String,
    pub device: Device,
    pub config: StreamConfig,
    pub sample_format: SampleFormat,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioDevice {
    pub fn list_inputs() -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let host: Host = cpal::default_host();
        let names = host
            .input_devices()?
            .filter_map(|device| device.name().ok())
            .collect();
        Ok(names)
    }

    pub fn default_input_name() -> Option<String> {
        cpal::default_host()
            .default_input_device()
            .and_then(|device| device.name().ok())
    }

    pub fn input_by_name(
        name: &str,
        preferred_rate: u32,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let host: Host = cpal::default_host();
        let device = host
            .input_devices()?
            .find(|device| device.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| format!("Input device not found: {}", name))?;

        Self::from_device(device, preferred_rate)
    }

    pub fn default_input(preferred_rate: u32) -> Result<Self, Box<dyn std::error::Error>> {
        let host: Host = cpal::default_host();
        let device: Device = host
            .default_input_device()
            .ok_or("No input device available")?;

        Self::from_device(device, preferred_rate)
    }

    fn from_device(device: Device, preferred_rate: u32) -> Result<Self, Box<dyn std::error::Error>> {
        let name = device.name().unwrap_or_else(|_| "Unknown input".to_string());

        let supported = match device.supported_input_configs() {
            Ok(ranges) => pick_input_config(ranges, preferred_rate),
            Err(_) => None,
        };
        let supported = match supported {
            Some(config) => config,
            None => device.default_input_config()?,
        };

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let SampleRate(sample_rate) = config.sample_rate;
        let channels = config.channels;

        Ok(Self {
            name,
            device,
            config,
            sample_format,
            sample_rate,
            channels,
        })
    }

    fn build_stream<T>(&self, mut sink: BlockSink) -> Result<Stream, cpal::BuildStreamError>
    where
        T: SizedSample,
        i16: FromSample<T>,
        f32: FromSample<T>,
    {
        let channels = self.channels as usize;
        self.device.build_input_stream(
            &self.config,
            move |data: &[T], _: &cpal::InputCallbackInfo| sink.push_frames(data, channels),
            err_fn,
            None,
        )
    }
}

impl InputSource for AudioDevice {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn open(&self, sink: BlockSink) -> Result<Box<dyn ActiveInput>, Box<dyn std::error::Error>> {
        let stream = match self.sample_format {
            SampleFormat::I8 => self.build_stream::<i8>(sink)?,
            SampleFormat::I16 => self.build_stream::<i16>(sink)?,
            SampleFormat::I32 => self.build_stream::<i32>(sink)?,
            SampleFormat::U8 => self.build_stream::<u8>(sink)?,
            SampleFormat::U16 => self.build_stream::<u16>(sink)?,
            SampleFormat::F32 => self.build_stream::<f32>(sink)?,
            SampleFormat::F64 => self.build_stream::<f64>(sink)?,
            other => return Err(format!("Unsupported sample format: {:?}", other).into()),
        };

        stream.play()?;
        DebugLogger::log_global(format!(
            "{}: {} Hz, {} ch, {:?}",
            self.name, self.sample_rate, self.channels, self.sample_format
        ));
        Ok(Box::new(stream))
    }
}

fn err_fn(err: cpal::StreamError) {
    DebugLogger::log_global(format!("Stream error: {}", err));
}

fn format_rank(format: SampleFormat) -> u8 {
    match format {
        SampleFormat::I16 => 0,
        SampleFormat::F32 => 1,
        _ => 2,
    }
}

/// Best range that can run at `preferred_rate`: fewest channels, then
/// native 16-bit over float over anything else.
pub fn pick_input_config<I>(ranges: I, preferred_rate: u32) -> Option<SupportedStreamConfig>
where
    I: IntoIterator<Item = SupportedStreamConfigRange>,
{
    let rate = SampleRate(preferred_rate);
    ranges
        .into_iter()
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .min_by_key(|range| (range.channels(), format_rank(range.sample_format())))
        .map(|range| range.with_sample_rate(rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::SupportedBufferSize;

    fn range(channels: u16, min: u32, max: u32, format: SampleFormat) -> SupportedStreamConfigRange {
        SupportedStreamConfigRange::new(
            channels,
            SampleRate(min),
            SampleRate(max),
            SupportedBufferSize::Unknown,
            format,
        )
    }

    #[test]
    fn prefers_mono_sixteen_bit_at_cd_rate() {
        let picked = pick_input_config(
            vec![
                range(2, 8000, 96000, SampleFormat::I16),
                range(1, 8000, 96000, SampleFormat::F32),
                range(1, 8000, 96000, SampleFormat::I16),
            ],
            44100,
        )
        .unwrap();

        assert_eq!(picked.channels(), 1);
        assert_eq!(picked.sample_format(), SampleFormat::I16);
        assert_eq!(picked.sample_rate(), SampleRate(44100));
    }

    #[test]
    fn skips_ranges_without_the_rate() {
        let picked = pick_input_config(
            vec![
                range(1, 48000, 48000, SampleFormat::I16),
                range(2, 44100, 48000, SampleFormat::F32),
            ],
            44100,
        )
        .unwrap();

        assert_eq!(picked.channels(), 2);
        assert_eq!(picked.sample_format(), SampleFormat::F32);
    }

    #[test]
    fn none_when_rate_unsupported() {
        assert!(pick_input_config(vec![range(1, 48000, 48000, SampleFormat::I16)], 44100).is_none());
    }
}
