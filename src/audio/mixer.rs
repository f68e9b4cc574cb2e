// ToneMixer - real-time voice mixer for cue tones
//
// The control side pushes commands through a lock-free SPSC queue; the audio
// callback drains it at the start of every buffer and sums the active voices.
//
// Voices are keyed by cue kind: replaying a kind restarts its voice from the
// top, while different kinds overlap freely. The callback never allocates;
// clips arrive as `Arc<[f32]>` clones held alive by the tone bank.

use std::sync::{Arc, Mutex};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::cue::CueKind;
use crate::error::AudioError;

/// Default command queue depth
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

pub enum MixerCommand {
    Play {
        kind: CueKind,
        clip: Arc<[f32]>,
        gain: f32,
    },
    StopAll,
}

struct Voice {
    clip: Arc<[f32]>,
    position: usize,
    gain: f32,
}

/// Audio-thread half. Owned by the output stream callback.
pub struct ToneMixer {
    voices: [Option<Voice>; CueKind::COUNT],
    commands: Consumer<MixerCommand>,
}

/// Control half. Shared by whoever triggers cues.
pub struct MixerHandle {
    commands: Mutex<Producer<MixerCommand>>,
}

impl ToneMixer {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(command_capacity: usize) -> (ToneMixer, MixerHandle) {
        let (producer, consumer) = RingBuffer::new(command_capacity.max(1));
        (
            ToneMixer {
                voices: [None, None, None, None],
                commands: consumer,
            },
            MixerHandle {
                commands: Mutex::new(producer),
            },
        )
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|voice| voice.is_some()).count()
    }

    fn apply_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                MixerCommand::Play { kind, clip, gain } => {
                    self.voices[kind.index()] = Some(Voice {
                        clip,
                        position: 0,
                        gain,
                    });
                }
                MixerCommand::StopAll => {
                    for voice in self.voices.iter_mut() {
                        *voice = None;
                    }
                }
            }
        }
    }

    /// Fills an interleaved output buffer, writing the mono mix to every
    /// channel. Output is clamped to `[-1, 1]`.
    pub fn render(&mut self, output: &mut [f32], channels: usize) {
        self.apply_commands();

        let channels = channels.max(1);
        for frame in output.chunks_mut(channels) {
            let mut sample = 0.0_f32;
            for slot in self.voices.iter_mut() {
                if let Some(voice) = slot {
                    sample += voice.clip[voice.position] * voice.gain;
                    voice.position += 1;
                    if voice.position >= voice.clip.len() {
                        *slot = None;
                    }
                }
            }
            let sample = sample.clamp(-1.0, 1.0);
            for out in frame.iter_mut() {
                *out = sample;
            }
        }
    }
}

impl MixerHandle {
    /// Queues a (re)start of the voice for `kind`.
    pub fn play(&self, kind: CueKind, clip: Arc<[f32]>, gain: f32) -> Result<(), AudioError> {
        if clip.is_empty() {
            return Ok(());
        }
        self.push(MixerCommand::Play { kind, clip, gain })
    }

    /// Silences every voice at the start of the next buffer.
    pub fn stop_all(&self) -> Result<(), AudioError> {
        self.push(MixerCommand::StopAll)
    }

    fn push(&self, command: MixerCommand) -> Result<(), AudioError> {
        let mut producer = self
            .commands
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "mixer_commands".to_string(),
            })?;
        producer.push(command).map_err(|_| AudioError::StreamFailure {
            reason: "mixer command queue full".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(values: &[f32]) -> Arc<[f32]> {
        values.to_vec().into()
    }

    #[test]
    fn test_silence_without_voices() {
        let (mut mixer, _handle) = ToneMixer::new(8);
        let mut out = vec![1.0; 16];
        mixer.render(&mut out, 2);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_voice_plays_to_end_then_frees() {
        let (mut mixer, handle) = ToneMixer::new(8);
        handle
            .play(CueKind::Takeaway, clip(&[0.5, 0.5, 0.5]), 1.0)
            .unwrap();

        let mut out = vec![0.0; 4];
        mixer.render(&mut out, 1);
        assert_eq!(out, vec![0.5, 0.5, 0.5, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_different_kinds_overlap() {
        let (mut mixer, handle) = ToneMixer::new(8);
        handle
            .play(CueKind::Takeaway, clip(&[0.25; 4]), 1.0)
            .unwrap();
        handle
            .play(CueKind::Metronome, clip(&[0.25; 4]), 0.5)
            .unwrap();

        let mut out = vec![0.0; 2];
        mixer.render(&mut out, 1);
        assert!((out[0] - 0.375).abs() < 1e-6);
        assert_eq!(mixer.active_voices(), 2);
    }

    #[test]
    fn test_replay_restarts_same_kind() {
        let (mut mixer, handle) = ToneMixer::new(8);
        handle
            .play(CueKind::Impact, clip(&[0.1, 0.2, 0.3, 0.4]), 1.0)
            .unwrap();
        let mut out = vec![0.0; 2];
        mixer.render(&mut out, 1);
        assert_eq!(out, vec![0.1, 0.2]);

        handle
            .play(CueKind::Impact, clip(&[0.1, 0.2, 0.3, 0.4]), 1.0)
            .unwrap();
        mixer.render(&mut out, 1);
        assert_eq!(out, vec![0.1, 0.2]);
        assert_eq!(mixer.active_voices(), 1);
    }

    #[test]
    fn test_stop_all_and_stereo_duplication() {
        let (mut mixer, handle) = ToneMixer::new(8);
        handle.play(CueKind::Downswing, clip(&[0.9; 8]), 1.0).unwrap();

        let mut out = vec![0.0; 4];
        mixer.render(&mut out, 2);
        assert_eq!(out, vec![0.9, 0.9, 0.9, 0.9]);

        handle.stop_all().unwrap();
        mixer.render(&mut out, 2);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_output_is_clamped() {
        let (mut mixer, handle) = ToneMixer::new(8);
        for kind in CueKind::ALL {
            handle.play(kind, clip(&[0.9; 2]), 1.0).unwrap();
        }
        let mut out = vec![0.0; 2];
        mixer.render(&mut out, 1);
        assert_eq!(out, vec![1.0, 1.0]);
    }

    #[test]
    fn test_full_queue_reports_failure() {
        let (_mixer, handle) = ToneMixer::new(1);
        handle.stop_all().unwrap();
        assert!(matches!(
            handle.stop_all(),
            Err(AudioError::StreamFailure { .. })
        ));
    }
}
