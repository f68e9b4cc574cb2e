use std::sync::{Mutex, RwLock};

use crate::audio::mixer::MixerHandle;
use crate::audio::speech::SpeechChannel;
use crate::audio::tones::ToneBank;
use crate::catalog::ShotType;
use crate::config::CueConfig;
use crate::error::log_audio_error;

use super::{cue_gain, CueBinding, CueKind, CuePlayer};

/// Cue player backed by a real output stream.
///
/// Tones go through the stream's [`ToneMixer`](crate::audio::mixer::ToneMixer);
/// speech goes through its own [`SpeechChannel`].
pub struct DeviceCuePlayer {
    bank: ToneBank,
    mixer: MixerHandle,
    speech: SpeechChannel,
    config: CueConfig,
    binding: RwLock<Option<CueBinding>>,
    /// Keeps the platform stream alive until cleanup.
    stream: Mutex<Option<Box<dyn Send>>>,
}

impl DeviceCuePlayer {
    pub fn new(
        bank: ToneBank,
        mixer: MixerHandle,
        speech: SpeechChannel,
        config: CueConfig,
        stream: Option<Box<dyn Send>>,
    ) -> Self {
        Self {
            bank,
            mixer,
            speech,
            config,
            binding: RwLock::new(None),
            stream: Mutex::new(stream),
        }
    }

    fn gain_for(&self, kind: CueKind) -> f32 {
        let binding = self
            .binding
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match binding.as_ref() {
            Some(binding) => cue_gain(kind, &self.config, binding.shot_type, binding.volume),
            None => cue_gain(kind, &self.config, ShotType::LongGame, 1.0),
        }
    }
}

impl CuePlayer for DeviceCuePlayer {
    fn bind(&self, binding: CueBinding) {
        log::info!(
            "[CuePlayer] Bound to {} / {} (volume {:.2})",
            binding.shot_type,
            binding.pro_name,
            binding.volume
        );
        *self
            .binding
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(binding);
    }

    fn play_cue(&self, kind: CueKind) {
        let clip = match self.bank.clip(kind) {
            Ok(clip) => clip,
            Err(err) => {
                log_audio_error(&err, "DeviceCuePlayer::play_cue");
                return;
            }
        };
        let gain = self.gain_for(kind);
        if let Err(err) = self.mixer.play(kind, clip.samples().clone(), gain) {
            log_audio_error(&err, "DeviceCuePlayer::play_cue");
        }
    }

    fn speak(&self, text: &str) {
        self.speech.speak(text);
    }

    fn cleanup(&self) {
        self.speech.stop_all();
        if let Err(err) = self.mixer.stop_all() {
            log_audio_error(&err, "DeviceCuePlayer::cleanup");
        }
        self.binding
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if self
            .stream
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .is_some()
        {
            log::info!("[CuePlayer] Output stream released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mixer::ToneMixer;
    use crate::audio::speech::LogSpeech;
    use crate::tempo::phase_durations;
    use std::sync::Arc;

    fn player(bank: ToneBank) -> (DeviceCuePlayer, ToneMixer) {
        let (mixer, handle) = ToneMixer::new(16);
        let speech = SpeechChannel::new(Arc::new(LogSpeech));
        (
            DeviceCuePlayer::new(bank, handle, speech, CueConfig::default(), None),
            mixer,
        )
    }

    #[test]
    fn test_play_cue_reaches_mixer() {
        let (player, mut mixer) = player(ToneBank::synthesized(8_000));
        player.play_cue(CueKind::Takeaway);
        player.play_cue(CueKind::Metronome);

        let mut out = vec![0.0; 64];
        mixer.render(&mut out, 1);
        assert_eq!(mixer.active_voices(), 2);
    }

    #[test]
    fn test_missing_asset_is_a_no_op() {
        let (player, mut mixer) = player(ToneBank::from_dir("/nonexistent", 8_000));
        player.play_cue(CueKind::Impact);

        let mut out = vec![0.0; 16];
        mixer.render(&mut out, 1);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_binding_volume_applies() {
        let (player, _mixer) = player(ToneBank::synthesized(8_000));
        assert!((player.gain_for(CueKind::Impact) - 0.9).abs() < 1e-6);

        player.bind(CueBinding {
            shot_type: ShotType::Putting,
            pro_name: "Tiger Woods".to_string(),
            durations: phase_durations(76.0, 2.0).unwrap(),
            volume: 0.5,
        });
        assert!((player.gain_for(CueKind::Impact) - 0.4).abs() < 1e-6);

        player.cleanup();
        assert!((player.gain_for(CueKind::Impact) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_cleanup_silences_voices() {
        let (player, mut mixer) = player(ToneBank::synthesized(8_000));
        player.play_cue(CueKind::Downswing);
        player.cleanup();
        player.cleanup();

        let mut out = vec![0.0; 32];
        mixer.render(&mut out, 1);
        assert_eq!(mixer.active_voices(), 0);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
