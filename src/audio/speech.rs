//! Speech channel - spoken announcements on their own worker thread
//!
//! Utterances are queued FIFO and spoken one at a time, independent of tone
//! playback. `stop_all` invalidates everything queued and interrupts the
//! utterance in progress.

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{log_audio_error, AudioError};

/// Poll interval while waiting on an external speech process
const SPEECH_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A text-to-speech engine.
pub trait SpeechSynthesizer: Send + Sync {
    /// Speaks `text`, returning when it finishes or is interrupted.
    fn speak_blocking(&self, text: &str) -> Result<(), AudioError>;

    /// Cuts off the utterance in progress, if any.
    fn interrupt(&self);
}

/// Writes utterances to the log. Used where no speech engine exists.
#[derive(Default)]
pub struct LogSpeech;

impl SpeechSynthesizer for LogSpeech {
    fn speak_blocking(&self, text: &str) -> Result<(), AudioError> {
        log::info!("[Speech] \"{}\"", text);
        Ok(())
    }

    fn interrupt(&self) {}
}

/// Runs an external TTS program (`say` on macOS, `espeak` elsewhere).
pub struct CommandSpeech {
    program: String,
    current: Mutex<Option<Child>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current: Mutex::new(None),
        }
    }

    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say")
        } else {
            Self::new("espeak")
        }
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<Child>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SpeechSynthesizer for CommandSpeech {
    fn speak_blocking(&self, text: &str) -> Result<(), AudioError> {
        let child = Command::new(&self.program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| AudioError::SpeechSynthesisFailure {
                reason: format!("{}: {}", self.program, err),
            })?;
        *self.lock_current() = Some(child);

        loop {
            {
                let mut guard = self.lock_current();
                let Some(child) = guard.as_mut() else {
                    // interrupted
                    return Ok(());
                };
                match child.try_wait() {
                    Ok(Some(status)) => {
                        *guard = None;
                        return if status.success() {
                            Ok(())
                        } else {
                            Err(AudioError::SpeechSynthesisFailure {
                                reason: format!("{} exited with {}", self.program, status),
                            })
                        };
                    }
                    Ok(None) => {}
                    Err(err) => {
                        *guard = None;
                        return Err(AudioError::SpeechSynthesisFailure {
                            reason: err.to_string(),
                        });
                    }
                }
            }
            std::thread::sleep(SPEECH_POLL_INTERVAL);
        }
    }

    fn interrupt(&self) {
        if let Some(mut child) = self.lock_current().take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

struct Utterance {
    text: String,
    generation: u64,
}

/// FIFO speech queue served by a dedicated thread.
pub struct SpeechChannel {
    sender: Option<mpsc::UnboundedSender<Utterance>>,
    generation: Arc<AtomicU64>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    worker: Option<JoinHandle<()>>,
}

impl SpeechChannel {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Utterance>();
        let generation = Arc::new(AtomicU64::new(0));

        let worker_generation = Arc::clone(&generation);
        let worker_synth = Arc::clone(&synthesizer);
        let worker = std::thread::Builder::new()
            .name("speech".to_string())
            .spawn(move || {
                while let Some(utterance) = receiver.blocking_recv() {
                    if utterance.generation != worker_generation.load(Ordering::SeqCst) {
                        continue;
                    }
                    if let Err(err) = worker_synth.speak_blocking(&utterance.text) {
                        log_audio_error(&err, "SpeechChannel");
                    }
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                log_audio_error(
                    &AudioError::SpeechSynthesisFailure {
                        reason: format!("failed to spawn speech thread: {}", err),
                    },
                    "SpeechChannel::new",
                );
                None
            }
        };

        Self {
            sender: worker.as_ref().map(|_| sender),
            generation,
            synthesizer,
            worker,
        }
    }

    /// Queues an utterance. Never blocks.
    pub fn speak(&self, text: &str) {
        let Some(sender) = &self.sender else {
            log_audio_error(
                &AudioError::SpeechSynthesisFailure {
                    reason: "speech thread unavailable".to_string(),
                },
                "SpeechChannel::speak",
            );
            return;
        };
        let utterance = Utterance {
            text: text.to_string(),
            generation: self.generation.load(Ordering::SeqCst),
        };
        if sender.send(utterance).is_err() {
            log_audio_error(
                &AudioError::SpeechSynthesisFailure {
                    reason: "speech thread stopped".to_string(),
                },
                "SpeechChannel::speak",
            );
        }
    }

    /// Drops queued utterances and interrupts the current one.
    pub fn stop_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.synthesizer.interrupt();
    }
}

impl Drop for SpeechChannel {
    fn drop(&mut self) {
        self.stop_all();
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[derive(Default)]
    struct CollectingSpeech {
        spoken: Mutex<Vec<String>>,
    }

    impl SpeechSynthesizer for CollectingSpeech {
        fn speak_blocking(&self, text: &str) -> Result<(), AudioError> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn interrupt(&self) {}
    }

    fn wait_for(predicate: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        predicate()
    }

    #[test]
    fn test_utterances_spoken_in_order() {
        let synth = Arc::new(CollectingSpeech::default());
        let channel = SpeechChannel::new(synth.clone());
        channel.speak("Starting Adam Scott");
        channel.speak("Address the ball");

        assert!(wait_for(|| synth.spoken.lock().unwrap().len() == 2));
        assert_eq!(
            *synth.spoken.lock().unwrap(),
            vec!["Starting Adam Scott", "Address the ball"]
        );
    }

    #[test]
    fn test_drop_joins_worker() {
        let synth = Arc::new(CollectingSpeech::default());
        {
            let channel = SpeechChannel::new(synth.clone());
            channel.speak("one");
        }
        assert!(synth.spoken.lock().unwrap().len() <= 1);
    }

    #[test]
    fn test_missing_program_is_reported_not_fatal() {
        let speech = CommandSpeech::new("definitely-not-a-tts-binary");
        let err = speech.speak_blocking("hello").unwrap_err();
        assert!(matches!(err, AudioError::SpeechSynthesisFailure { .. }));
        speech.interrupt();
    }
}
