//! Shout detection over decoded audio.
//!
//! Clips are decoded with symphonia, downmixed to mono, resampled to the
//! analysis rate, and scanned with a sliding RMS window. A shout is a run of
//! loud, non-impulsive frames lasting at least `min_run_ms`.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use rubato::{FftFixedIn, Resampler};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use oneul_core::{
    config::ShoutDetectorConfig, traits::ShoutDetector, types::ShoutDetection, Error, Result,
};

use crate::audio::AudioFormat;

/// Input frames per resampler chunk.
const RESAMPLE_CHUNK: usize = 1024;

/// Floor applied before taking logarithms.
const EPSILON: f64 = 1e-9;

/// Shout detector running the RMS window scan on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct RmsShoutDetector {
    config: ShoutDetectorConfig,
}

impl RmsShoutDetector {
    pub fn new(config: ShoutDetectorConfig) -> Self {
        Self { config }
    }

    /// Decode, normalize, and scan an encoded clip synchronously.
    pub fn analyze(&self, audio: Bytes) -> Result<ShoutDetection> {
        let (mono, sample_rate) = decode_mono(audio, &self.config)?;
        let target = self.config.target_sample_rate;
        let mut samples = resample(mono, sample_rate, target)?;
        for sample in samples.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        tracing::info!(
            samples = samples.len(),
            sample_rate = target,
            "Analyzing audio signal"
        );
        Ok(detect_shout(&samples, target, &self.config))
    }
}

#[async_trait]
impl ShoutDetector for RmsShoutDetector {
    async fn detect(&self, audio: Bytes) -> Result<ShoutDetection> {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.analyze(audio))
            .await
            .map_err(|e| Error::internal(format!("shout detection task failed: {}", e)))?
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Level and crest factor of one analysis window.
#[derive(Debug, Clone, Copy)]
struct FrameStats {
    level_dbfs: f64,
    crest_db: f64,
}

impl FrameStats {
    fn measure(frame: &[f32]) -> Self {
        let (sum_sq, peak) = frame.iter().fold((0.0f64, 0.0f64), |(sum, peak), &s| {
            let s = s as f64;
            (sum + s * s, peak.max(s.abs()))
        });
        let rms = (sum_sq / frame.len().max(1) as f64).sqrt();

        Self {
            level_dbfs: 20.0 * rms.max(EPSILON).log10(),
            crest_db: 20.0 * ((peak + EPSILON) / (rms + EPSILON)).log10(),
        }
    }
}

/// A run of consecutive shouting frames, in sample offsets.
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    end: usize,
    peak_dbfs: f64,
}

/// Scan mono samples in [-1, 1] for the first qualifying shout.
pub fn detect_shout(samples: &[f32], sample_rate: u32, config: &ShoutDetectorConfig) -> ShoutDetection {
    let rate = sample_rate as u64;
    let window = (rate * config.window_ms as u64 / 1000) as usize;
    let hop = ((rate * config.hop_ms as u64 / 1000) as usize).max(1);

    if rate == 0 || window == 0 || samples.len() < window {
        tracing::info!("No frames available for shout detection");
        return ShoutDetection::absent();
    }

    let to_ms = |offset: usize| offset as u64 * 1000 / rate;
    let qualifies = |run: &Run| to_ms(run.end - run.start) >= config.min_run_ms as u64;
    let report = |run: Run| {
        ShoutDetection::detected(
            to_ms(run.start),
            to_ms(run.end),
            (run.peak_dbfs * 100.0).round() / 100.0,
            config.confidence,
        )
    };

    let mut current: Option<Run> = None;
    let mut offset = 0;

    while offset + window <= samples.len() {
        let stats = FrameStats::measure(&samples[offset..offset + window]);
        let shouting = stats.level_dbfs >= config.threshold_dbfs && stats.crest_db < config.max_crest_db;

        if shouting {
            let run = current.get_or_insert(Run {
                start: offset,
                end: offset + window,
                peak_dbfs: stats.level_dbfs,
            });
            run.end = offset + window;
            run.peak_dbfs = run.peak_dbfs.max(stats.level_dbfs);
        } else if let Some(run) = current.take() {
            if qualifies(&run) {
                tracing::info!(start = run.start, end = run.end, peak = run.peak_dbfs, "Shout detected mid-stream");
                return report(run);
            }
        }

        offset += hop;
    }

    if let Some(run) = current.filter(|run| qualifies(run)) {
        tracing::info!(start = run.start, end = run.end, peak = run.peak_dbfs, "Shout detected at stream end");
        return report(run);
    }

    tracing::info!("Shout not detected");
    ShoutDetection::absent()
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode an encoded clip to mono f32 samples and its sample rate.
fn decode_mono(audio: Bytes, config: &ShoutDetectorConfig) -> Result<(Vec<f32>, u32)> {
    let mut hint = Hint::new();
    if let Some(format) = AudioFormat::detect(&audio) {
        hint.with_extension(format.extension());
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(audio)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::detection(format!("unsupported audio: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::detection("no audio track found"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| Error::detection("unknown sample rate"))?;
    if !(config.min_sample_rate..=config.max_sample_rate).contains(&sample_rate) {
        return Err(Error::detection(format!(
            "unsupported sample rate {} Hz (expected {}..={})",
            sample_rate, config.min_sample_rate, config.max_sample_rate
        )));
    }

    let max_frames = (sample_rate as u64 * config.max_duration_ms / 1000) as usize;
    if let Some(frames) = codec_params.n_frames {
        if frames > max_frames as u64 {
            return Err(too_long(config));
        }
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| Error::detection(format!("unsupported codec: {}", e)))?;

    let mut mono = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut decode_errors = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(Error::detection(format!("failed to read audio: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                decode_errors += 1;
                tracing::warn!(error = %e, "Skipping undecodable audio packet");
                continue;
            }
            Err(e) => return Err(Error::detection(format!("failed to decode audio: {}", e))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let needed = decoded.capacity() * channels;

        // Reallocate when a packet is larger than any seen before.
        if sample_buf.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(decoded);
            if mono.len() + buf.samples().len() / channels > max_frames {
                return Err(too_long(config));
            }
            mono.extend(
                buf.samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    if mono.is_empty() && decode_errors > 0 {
        return Err(Error::detection("no audio could be decoded"));
    }

    Ok((mono, sample_rate))
}

fn too_long(config: &ShoutDetectorConfig) -> Error {
    Error::detection(format!(
        "audio is longer than {} ms",
        config.max_duration_ms
    ))
}

/// Resample mono audio, compensating for the resampler's delay.
fn resample(samples: Vec<f32>, from: u32, to: u32) -> Result<Vec<f32>> {
    if from == to || samples.is_empty() {
        return Ok(samples);
    }

    let resample_error = |e: rubato::ResampleError| Error::detection(format!("resampling failed: {}", e));

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, RESAMPLE_CHUNK, 2, 1)
        .map_err(|e| Error::detection(format!("resampler setup failed: {}", e)))?;

    let expected = (samples.len() as u64 * to as u64).div_ceil(from as u64) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);

    let mut position = 0;
    while position < samples.len() {
        let needed = resampler.input_frames_next();
        let end = position + needed;
        let frames = if end <= samples.len() {
            let chunk = vec![&samples[position..end]];
            resampler.process(chunk.as_slice(), None).map_err(resample_error)?
        } else {
            let chunk = vec![&samples[position..]];
            resampler
                .process_partial(Some(chunk.as_slice()), None)
                .map_err(resample_error)?
        };
        output.extend_from_slice(&frames[0]);
        position = end;
    }

    // Flush what is still buffered inside the resampler.
    while output.len() < expected + delay {
        let frames = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(resample_error)?;
        if frames[0].is_empty() {
            break;
        }
        output.extend_from_slice(&frames[0]);
    }

    let end = (delay + expected).min(output.len());
    let start = delay.min(end);
    Ok(output[start..end].to_vec())
}
