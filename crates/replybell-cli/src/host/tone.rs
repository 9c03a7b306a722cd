//! Completion tone playback.
//!
//! With the `audio` feature the tone is synthesized and played through the
//! default output device. Without it the terminal bell rings instead.

use replybell_core::dispatch::ToneSpec;
use replybell_core::error::ChannelError;

#[cfg(feature = "audio")]
mod synth {
    use replybell_core::dispatch::ToneSpec;
    use rodio::Source;
    use std::f32::consts::PI;
    use std::time::Duration;

    const SAMPLE_RATE: u32 = 44_100;

    /// Mono sine with an exponentially decaying gain envelope.
    pub struct DecayingTone {
        spec: ToneSpec,
        num_sample: usize,
        total_samples: usize,
    }

    impl DecayingTone {
        pub fn new(spec: ToneSpec) -> Self {
            Self {
                spec,
                num_sample: 0,
                total_samples: (spec.duration_secs * SAMPLE_RATE as f32) as usize,
            }
        }
    }

    impl Iterator for DecayingTone {
        type Item = f32;

        fn next(&mut self) -> Option<Self::Item> {
            if self.num_sample >= self.total_samples {
                return None;
            }
            let t = self.num_sample as f32 / SAMPLE_RATE as f32;
            self.num_sample += 1;
            Some((2.0 * PI * self.spec.frequency_hz * t).sin() * self.spec.gain_at(t))
        }
    }

    impl Source for DecayingTone {
        fn current_frame_len(&self) -> Option<usize> {
            Some(self.total_samples - self.num_sample)
        }

        fn channels(&self) -> u16 {
            1
        }

        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn total_duration(&self) -> Option<Duration> {
            Some(Duration::from_secs_f32(self.spec.duration_secs))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_tone_has_expected_length_and_envelope() {
            let samples: Vec<f32> = DecayingTone::new(ToneSpec::COMPLETION).collect();
            assert_eq!(samples.len(), 22_050);
            let peak_start = samples[..200].iter().fold(0.0f32, |m, s| m.max(s.abs()));
            let peak_end = samples[samples.len() - 200..]
                .iter()
                .fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(peak_start <= 0.3 + f32::EPSILON);
            assert!(peak_end < 0.02);
        }
    }
}

/// Start the tone and return once playback has begun (or failed to).
#[cfg(feature = "audio")]
pub fn play(spec: &ToneSpec) -> Result<(), ChannelError> {
    use rodio::{OutputStream, Sink};
    use std::sync::mpsc;
    use std::thread;

    let spec = *spec;
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

    // The output stream is not Send; it lives and dies on this thread.
    thread::Builder::new()
        .name("tone".to_string())
        .spawn(move || {
            let opened = OutputStream::try_default()
                .map_err(|e| format!("Failed to create audio output stream: {e}"))
                .and_then(|(stream, handle)| {
                    Sink::try_new(&handle)
                        .map(|sink| (stream, sink))
                        .map_err(|e| format!("Failed to create audio sink: {e}"))
                });
            match opened {
                Ok((_stream, sink)) => {
                    let _ = ready_tx.send(Ok(()));
                    sink.append(synth::DecayingTone::new(spec));
                    sink.sleep_until_end();
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        })
        .map_err(|e| ChannelError::Failed {
            channel: "tone",
            message: e.to_string(),
        })?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(message)) => Err(ChannelError::Failed {
            channel: "tone",
            message,
        }),
        Err(_) => Err(ChannelError::Failed {
            channel: "tone",
            message: "audio thread exited early".to_string(),
        }),
    }
}

/// Ring the terminal bell on stderr, leaving stdout to the JSON records.
#[cfg(not(feature = "audio"))]
pub fn play(_spec: &ToneSpec) -> Result<(), ChannelError> {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    stderr
        .write_all(b"\x07")
        .and_then(|()| stderr.flush())
        .map_err(|e| ChannelError::Failed {
            channel: "tone",
            message: e.to_string(),
        })
}
