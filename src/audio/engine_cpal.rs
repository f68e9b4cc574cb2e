//! Desktop audio I/O via cpal
//!
//! cpal streams are not `Send` on every host, so each stream lives on its
//! own thread for its whole life. The opener waits for the thread to report
//! whether the device opened, then holds a [`CpalStreamHandle`] that shuts
//! the thread (and stream) down when closed or dropped.

use std::sync::mpsc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::capture::{AudioCapture, BlockHandler};
use super::mixer::ToneMixer;
use crate::error::AudioError;

/// Pre-allocated de-interleave scratch size (frames)
const SCRATCH_FRAMES: usize = 8192;

/// Owns the thread that owns a running cpal stream.
pub struct CpalStreamHandle {
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    sample_rate: u32,
}

impl CpalStreamHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn close(&mut self) {
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for CpalStreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Spawns a stream thread. `build` runs on that thread and returns the
/// stream together with its sample rate.
fn spawn_stream_thread<F>(name: &str, build: F) -> Result<CpalStreamHandle, AudioError>
where
    F: FnOnce() -> Result<(cpal::Stream, u32), AudioError> + Send + 'static,
{
    let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, AudioError>>();
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let thread = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let (stream, sample_rate) = match build() {
                Ok(opened) => opened,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            if let Err(err) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
                    reason: format!("Failed to start stream: {:?}", err),
                }));
                return;
            }
            let _ = ready_tx.send(Ok(sample_rate));

            // Park until the handle is closed (sender dropped)
            let _ = stop_rx.recv();
            drop(stream);
        })
        .map_err(|err| AudioError::StreamOpenFailed {
            reason: format!("Failed to spawn {} thread: {}", name, err),
        })?;

    match ready_rx.recv() {
        Ok(Ok(sample_rate)) => Ok(CpalStreamHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            sample_rate,
        }),
        Ok(Err(err)) => {
            let _ = thread.join();
            Err(err)
        }
        Err(_) => {
            let _ = thread.join();
            Err(AudioError::StreamFailure {
                reason: format!("{} thread exited before reporting", name),
            })
        }
    }
}

/// Opens the default output device and renders `mixer` into it.
///
/// Only F32 output is supported; the mono mix is copied to every channel.
pub fn open_output_stream(mixer: ToneMixer) -> Result<CpalStreamHandle, AudioError> {
    spawn_stream_thread("cue-output", move || {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceUnavailable {
                details: "No default output device found".to_string(),
            })?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to get default output config: {:?}", e),
            })?;

        let stream_config: cpal::StreamConfig = config.clone().into();
        let channels_count = stream_config.channels as usize;
        let sample_rate = stream_config.sample_rate.0;
        let mut mixer = mixer;

        let err_fn = |err| log::error!("[CpalOutput] Output stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mixer.render(data, channels_count);
                },
                err_fn,
                None,
            ),
            _ => {
                return Err(AudioError::StreamOpenFailed {
                    reason: "Only F32 sample format is currently supported for output"
                        .to_string(),
                })
            }
        }
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        log::info!(
            "[CpalOutput] Output stream open: {} Hz, {} channel(s)",
            sample_rate,
            channels_count
        );
        Ok((stream, sample_rate))
    })
}

/// Microphone capture on the default input device.
#[derive(Default)]
pub struct CpalCapture {
    stream: Option<CpalStreamHandle>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioCapture for CpalCapture {
    fn start(&mut self, handler: BlockHandler) -> Result<u32, AudioError> {
        if self.stream.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        let handle = spawn_stream_thread("swing-capture", move || {
            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| AudioError::DeviceUnavailable {
                    details: "No default input device found".to_string(),
                })?;

            let config = device
                .default_input_config()
                .map_err(|e| AudioError::StreamOpenFailed {
                    reason: format!("Failed to get default input config: {:?}", e),
                })?;

            let stream_config: cpal::StreamConfig = config.clone().into();
            let channels_count = stream_config.channels as usize;
            let sample_rate = stream_config.sample_rate.0;
            let mut handler = handler;
            let mut scratch: Vec<f32> = Vec::with_capacity(SCRATCH_FRAMES);

            let err_fn = |err| log::error!("[CpalCapture] Input stream error: {}", err);

            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if channels_count <= 1 {
                            handler(data);
                        } else {
                            // De-interleave: take first channel
                            scratch.clear();
                            scratch.extend(data.chunks(channels_count).map(|frame| frame[0]));
                            handler(&scratch);
                        }
                    },
                    err_fn,
                    None,
                ),
                _ => {
                    return Err(AudioError::StreamOpenFailed {
                        reason: "Only F32 sample format is currently supported for input"
                            .to_string(),
                    })
                }
            }
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("{:?}", e),
            })?;

            log::info!(
                "[CpalCapture] Input stream open: {} Hz, {} channel(s)",
                sample_rate,
                channels_count
            );
            Ok((stream, sample_rate))
        })?;

        let sample_rate = handle.sample_rate();
        self.stream = Some(handle);
        Ok(sample_rate)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(mut handle) = self.stream.take() {
            handle.close();
        }
        Ok(())
    }
}
