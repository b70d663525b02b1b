use std::fs;
use std::io::Cursor;
use std::io::Read;
use std::path::Path;

pub const HEADER_SIZE: usize = 44;

#[derive(Debug, Clone, PartialEq)]
pub struct WavHeader {
    pub chunk_id: [u8; 4],     // "RIFF"
    pub chunk_size: u32,       // File size - 8
    pub format: [u8; 4],       // "WAVE"
    pub subchunk1_id: [u8; 4], // "fmt "
    pub subchunk1_size: u32,   // 16 for PCM
    pub audio_format: u16,     // 1 for PCM
    pub num_channels: u16,     // 1 for mono, 2 for stereo
    pub sample_rate: u32,      // e.g., 44100
    pub byte_rate: u32,        // SampleRate * NumChannels * BitsPerSample/8
    pub block_align: u16,      // NumChannels * BitsPerSample/8
    pub bits_per_sample: u16,  // 16 only
}

#[derive(Debug, Clone)]
pub struct WavFile {
    pub header: WavHeader,
    pub audio_data: Vec<u8>,
}

impl WavFile {
    pub fn new(sample_rate: u32, num_channels: u16) -> Self {
        WavFile {
            header: WavHeader {
                chunk_id: *b"RIFF",
                chunk_size: (HEADER_SIZE - 8) as u32,
                format: *b"WAVE",
                subchunk1_id: *b"fmt ",
                subchunk1_size: 16,
                audio_format: 1,
                num_channels,
                sample_rate,
                byte_rate: sample_rate * num_channels as u32 * 2,
                block_align: num_channels * 2,
                bits_per_sample: 16,
            },
            audio_data: Vec::new(),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut cursor = Cursor::new(&bytes);
        let mut header = WavHeader {
            chunk_id: [0; 4],
            chunk_size: 0,
            format: [0; 4],
            subchunk1_id: [0; 4],
            subchunk1_size: 0,
            audio_format: 0,
            num_channels: 0,
            sample_rate: 0,
            byte_rate: 0,
            block_align: 0,
            bits_per_sample: 0,
        };

        cursor.read_exact(&mut header.chunk_id)?;
        header.chunk_size = read_u32(&mut cursor)?;
        cursor.read_exact(&mut header.format)?;
        cursor.read_exact(&mut header.subchunk1_id)?;
        header.subchunk1_size = read_u32(&mut cursor)?;
        header.audio_format = read_u16(&mut cursor)?;
        header.num_channels = read_u16(&mut cursor)?;
        header.sample_rate = read_u32(&mut cursor)?;
        header.byte_rate = read_u32(&mut cursor)?;
        header.block_align = read_u16(&mut cursor)?;
        header.bits_per_sample = read_u16(&mut cursor)?;

        if header.chunk_id != *b"RIFF" || header.format != *b"WAVE" {
            return Err("Not a valid WAV file".into());
        }
        if header.subchunk1_id != *b"fmt " {
            return Err("Missing fmt chunk".into());
        }
        if header.audio_format != 1 {
            return Err(format!(
                "Unsupported audio format: {} (only PCM is supported)",
                header.audio_format
            )
            .into());
        }
        if header.bits_per_sample != 16 {
            return Err(format!(
                "Unsupported bits per sample: {} (only 16-bit is supported)",
                header.bits_per_sample
            )
            .into());
        }

        // Extended fmt chunks carry extra bytes before the next chunk
        let mut position = 20 + header.subchunk1_size as usize;
        let mut data_chunk: Option<(usize, usize)> = None;

        while position + 8 <= bytes.len() {
            let chunk_id = &bytes[position..position + 4];
            let chunk_size = u32::from_le_bytes([
                bytes[position + 4],
                bytes[position + 5],
                bytes[position + 6],
                bytes[position + 7],
            ]) as usize;

            if chunk_id == b"data" {
                data_chunk = Some((position + 8, chunk_size));
                break;
            }

            // Chunks are word aligned
            position += 8 + chunk_size + (chunk_size & 1);
        }

        let (start, size) = data_chunk.ok_or("Data chunk not found")?;
        let data_end = (start + size).min(bytes.len());
        let audio_data = bytes[start..data_end].to_vec();

        Ok(WavFile { header, audio_data })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.audio_data.len());

        bytes.extend_from_slice(&self.header.chunk_id);
        bytes.extend_from_slice(&self.header.chunk_size.to_le_bytes());
        bytes.extend_from_slice(&self.header.format);

        bytes.extend_from_slice(&self.header.subchunk1_id);
        bytes.extend_from_slice(&self.header.subchunk1_size.to_le_bytes());
        bytes.extend_from_slice(&self.header.audio_format.to_le_bytes());
        bytes.extend_from_slice(&self.header.num_channels.to_le_bytes());
        bytes.extend_from_slice(&self.header.sample_rate.to_le_bytes());
        bytes.extend_from_slice(&self.header.byte_rate.to_le_bytes());
        bytes.extend_from_slice(&self.header.block_align.to_le_bytes());
        bytes.extend_from_slice(&self.header.bits_per_sample.to_le_bytes());

        let data_size = self.header.chunk_size - (HEADER_SIZE - 8) as u32;
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_size.to_le_bytes());
        bytes.extend(&self.audio_data);

        bytes
    }

    pub fn sample_count(&self) -> usize {
        self.audio_data.len() / 2
    }

    pub fn duration_secs(&self) -> f64 {
        let frames = self.sample_count() / self.header.num_channels.max(1) as usize;
        if self.header.sample_rate == 0 {
            return 0.0;
        }
        frames as f64 / self.header.sample_rate as f64
    }

    pub fn to_i16_samples(&self) -> Vec<i16> {
        self.audio_data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Replace the payload with `samples`, written little-endian in order.
    /// Header sizes are settled on export.
    pub fn from_i16_samples(&mut self, samples: &[i16]) {
        let mut new_audio_data = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            new_audio_data.extend_from_slice(&sample.to_le_bytes());
        }

        self.audio_data = new_audio_data;
    }

    fn resize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.header.chunk_size = riff_chunk_size(self.audio_data.len())?;
        Ok(())
    }

    pub fn export_to_bytes(&mut self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        self.resize()?;
        Ok(self.to_bytes())
    }

    pub fn save_to_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = self.export_to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes)
    }
}

/// RIFF chunk size for `data_len` bytes of audio. Both size fields are 32-bit,
/// so a payload that cannot be described is an error rather than a wrapped header.
fn riff_chunk_size(data_len: usize) -> Result<u32, Box<dyn std::error::Error>> {
    u32::try_from(data_len)
        .ok()
        .and_then(|len| len.checked_add((HEADER_SIZE - 8) as u32))
        .ok_or_else(|| format!("Recording too large for a WAV file ({} bytes of audio)", data_len).into())
}

fn read_u32(cursor: &mut Cursor<&Vec<u8>>) -> Result<u32, std::io::Error> {
    let mut buffer = [0; 4];
    cursor.read_exact(&mut buffer)?;
    Ok(u32::from_le_bytes(buffer))
}

fn read_u16(cursor: &mut Cursor<&Vec<u8>>) -> Result<u16, std::io::Error> {
    let mut buffer = [0; 2];
    cursor.read_exact(&mut buffer)?;
    Ok(u16::from_le_bytes(buffer))
}
