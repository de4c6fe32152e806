use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::analysis::{BLOCK_LENGTH, SAMPLE_RATE};

/// A fully decoded mono stream, ready to be replayed into the pipeline as
/// fixed-length blocks.
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Exact [`BLOCK_LENGTH`]-sample blocks, in playback order. A trailing
    /// partial block is not yielded; see [`DecodedAudio::trailing_samples`].
    pub fn blocks(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.chunks_exact(BLOCK_LENGTH)
    }

    pub fn block_count(&self) -> usize {
        self.samples.len() / BLOCK_LENGTH
    }

    /// Samples left over after the last full block.
    pub fn trailing_samples(&self) -> usize {
        self.samples.len() % BLOCK_LENGTH
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decodes an audio file into a mono f32 stream.
///
/// Multi-channel content is averaged down to mono. The pipeline's note
/// mapping assumes [`SAMPLE_RATE`]; files at other rates are decoded as-is
/// with a warning rather than resampled.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;
    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Recoverable corruption: skip the packet, keep the stream.
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        downmix_into(&mut samples, sample_buf.samples(), channels);
    }

    if sample_rate != SAMPLE_RATE {
        log::warn!(
            "decoded at {sample_rate} Hz but the analysis is tuned for {SAMPLE_RATE} Hz; \
             note positions will be shifted"
        );
    }
    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.1}s, {} analysis blocks",
        samples.len(),
        sample_rate,
        samples.len() as f32 / sample_rate as f32,
        samples.len() / BLOCK_LENGTH
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    for frame in interleaved.chunks(channels) {
        out.push(frame.iter().sum::<f32>() / channels as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_channels() {
        let mut out = Vec::new();
        downmix_into(&mut out, &[1.0, 3.0, -2.0, 2.0], 2);
        assert_eq!(out, vec![2.0, 0.0]);
    }

    #[test]
    fn blocks_skip_the_trailing_partial() {
        let audio = DecodedAudio {
            samples: vec![0.0; BLOCK_LENGTH * 2 + 100],
            sample_rate: SAMPLE_RATE,
        };
        assert_eq!(audio.block_count(), 2);
        assert_eq!(audio.trailing_samples(), 100);
        assert_eq!(audio.blocks().count(), 2);
        assert!(audio.blocks().all(|b| b.len() == BLOCK_LENGTH));
    }
}
