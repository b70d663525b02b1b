use super::level::LevelMeter;
use super::take::Take;
use cpal::{FromSample, Sample};
use ringbuf::{
    traits::{Consumer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};
use std::thread::JoinHandle;

// Ring holds this many seconds of audio before the callback starts dropping
const RING_SECONDS: usize = 2;
const DRAIN_INTERVAL_MS: u64 = 50;
const DRAIN_CHUNK: usize = 4410;

/// Handle to a running input. Dropping it stops the callbacks.
pub trait ActiveInput {}

impl ActiveInput for () {}

/// Something that can deliver mono 16-bit blocks to a [`BlockSink`].
pub trait InputSource {
    fn name(&self) -> String;

    fn sample_rate(&self) -> u32;

    fn open(&self, sink: BlockSink) -> Result<Box<dyn ActiveInput>, Box<dyn std::error::Error>>;
}

/// Callback side of the capture pipeline.
pub struct BlockSink {
    producer: HeapProd<i16>,
    meter: LevelMeter,
    dropped: Arc<AtomicUsize>,
    scratch: Vec<i16>,
}

impl BlockSink {
    pub fn push_block(&mut self, block: &[i16]) {
        if block.is_empty() {
            return;
        }
        self.meter.update(block);

        let pushed = self.producer.push_slice(block);
        if pushed < block.len() {
            self.dropped
                .fetch_add(block.len() - pushed, Ordering::Relaxed);
        }
    }

    /// Downmix interleaved frames of any sample type and push them as one block.
    pub fn push_frames<T>(&mut self, data: &[T], channels: usize)
    where
        T: Sample,
        i16: FromSample<T>,
        f32: FromSample<T>,
    {
        let mut block = std::mem::take(&mut self.scratch);
        downmix_into(data, channels, &mut block);
        self.push_block(&block);
        self.scratch = block;
    }
}

/// Average interleaved frames down to mono `i16`.
pub fn downmix_into<T>(data: &[T], channels: usize, out: &mut Vec<i16>)
where
    T: Sample,
    i16: FromSample<T>,
    f32: FromSample<T>,
{
    out.clear();
    if channels <= 1 {
        out.extend(data.iter().map(|&s| i16::from_sample(s)));
        return;
    }

    out.extend(data.chunks_exact(channels).map(|frame| {
        let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
        i16::from_sample::<f32>(sum / channels as f32)
    }));
}

/// Background thread that moves samples from the ring buffer into the take.
pub struct CaptureWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    pub fn spawn(consumer: HeapCons<i16>, take: Arc<Mutex<Take>>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let should_stop = Arc::clone(&stop);

        let handle = std::thread::spawn(move || Self::run(consumer, take, should_stop));

        CaptureWorker {
            stop,
            handle: Some(handle),
        }
    }

    fn run(mut consumer: HeapCons<i16>, take: Arc<Mutex<Take>>, should_stop: Arc<AtomicBool>) {
        let mut drain_buf = vec![0i16; DRAIN_CHUNK];

        loop {
            // Read the flag first so the final drain below sees everything pushed before it
            let stopping = should_stop.load(Ordering::Acquire);
            Self::drain(&mut consumer, &take, &mut drain_buf);

            if stopping {
                break;
            }

            std::thread::sleep(std::time::Duration::from_millis(DRAIN_INTERVAL_MS));
        }
    }

    fn drain(consumer: &mut HeapCons<i16>, take: &Arc<Mutex<Take>>, drain_buf: &mut [i16]) {
        loop {
            let n = consumer.pop_slice(drain_buf);
            if n == 0 {
                break;
            }
            take.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .append(&drain_buf[..n]);
        }
    }

    /// Signal the thread, wait for its final drain.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Wire a sink and a worker around a fresh ring buffer.
pub fn capture_pipeline(
    sample_rate: u32,
    take: Arc<Mutex<Take>>,
    meter: LevelMeter,
    dropped: Arc<AtomicUsize>,
) -> (BlockSink, CaptureWorker) {
    let ring_size = (sample_rate as usize * RING_SECONDS).max(DRAIN_CHUNK);
    let ring = HeapRb::<i16>::new(ring_size);
    let (producer, consumer) = ring.split();

    let worker = CaptureWorker::spawn(consumer, take);
    let sink = BlockSink {
        producer,
        meter,
        dropped,
        scratch: Vec::new(),
    };

    (sink, worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::level::LEVEL_MAX;

    fn pipeline(rate: u32) -> (BlockSink, CaptureWorker, Arc<Mutex<Take>>, Arc<AtomicUsize>) {
        let take = Arc::new(Mutex::new(Take::new(rate)));
        let dropped = Arc::new(AtomicUsize::new(0));
        let (sink, worker) =
            capture_pipeline(rate, Arc::clone(&take), LevelMeter::new(), Arc::clone(&dropped));
        (sink, worker, take, dropped)
    }

    #[test]
    fn mono_i16_passes_through_untouched() {
        let mut out = Vec::new();
        downmix_into(&[i16::MIN, -1, 0, 1, i16::MAX], 1, &mut out);
        assert_eq!(out, vec![i16::MIN, -1, 0, 1, i16::MAX]);
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let mut out = Vec::new();
        downmix_into(&[100i16, 300, -50, 50, 7, 7], 2, &mut out);
        assert_eq!(out, vec![200, 0, 7]);

        downmix_into(&[0.5f32, -0.5, 1.0, 0.0], 2, &mut out);
        assert_eq!(out[0], 0);
        assert!((out[1] as i32 - 16384).abs() <= 1);
    }

    #[test]
    fn trailing_partial_frame_is_ignored() {
        let mut out = vec![99];
        downmix_into(&[10i16, 20, 30], 2, &mut out);
        assert_eq!(out, vec![15]);
    }

    #[test]
    fn worker_drains_everything_before_stopping() {
        let (mut sink, worker, take, dropped) = pipeline(44100);

        sink.push_block(&[1, 2, 3]);
        sink.push_frames(&[4i16, 5], 1);
        sink.push_block(&[]);
        worker.stop();

        assert_eq!(take.lock().unwrap().samples(), &[1, 2, 3, 4, 5]);
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn overflow_is_counted_not_blocking() {
        let (mut sink, worker, take, dropped) = pipeline(1);
        // Stop the worker first so nothing drains while we overfill
        drop(worker);

        let block = vec![1i16; DRAIN_CHUNK + 10];
        sink.push_block(&block);
        assert_eq!(dropped.load(Ordering::Relaxed), 10);
        assert!(take.lock().unwrap().is_empty());
    }

    #[test]
    fn sink_updates_level_meter() {
        let take = Arc::new(Mutex::new(Take::default()));
        let meter = LevelMeter::new();
        let (mut sink, worker) =
            capture_pipeline(44100, take, meter.clone(), Arc::new(AtomicUsize::new(0)));

        sink.push_block(&[i16::MAX; 64]);
        assert_eq!(meter.get(), LEVEL_MAX);
        worker.stop();
    }
}
