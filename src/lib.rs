// Golf Tempo Trainer Core - timed swing cues and microphone swing analysis
// Timer-driven cue sequencing with a lock-free capture pipeline

// Module declarations
pub mod analysis;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod http;
pub mod managers;
pub mod preferences;
pub mod sequencer;
pub mod tempo;
pub mod testing;

// Re-exports for convenience
pub use analysis::{AccuracyClass, SwingAnalyzer, SwingObservation};
pub use catalog::{ShotType, TempoCatalog};
pub use config::AppConfig;
pub use engine::{
    create_backend, AudioBackend, SessionOptions, SessionSnapshot, SessionSummary,
    SessionUpdate, TrainingController,
};
pub use error::{AudioError, CatalogError, ErrorCode, SessionError, TempoError};
pub use sequencer::{Sequencer, SequencerEvent, SwingPhase};
pub use tempo::TempoProfile;

/// Install the process-wide tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(target_os = "android")]
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    match tracing_android::layer("GolfTempoTrainer") {
        Ok(layer) => {
            let _ = tracing_subscriber::registry().with(layer).try_init();
        }
        Err(err) => eprintln!("failed to open Android log: {}", err),
    }
}

#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// JNI_OnLoad is called when the native library is loaded by Android
/// This function initializes the Android context required by oboe-rs
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    init_logging();

    log::info!("JNI_OnLoad called - initializing Android context");

    // SAFETY: called once by the Android runtime before any Oboe stream is
    // opened; the JavaVM pointer stays valid for the life of the process.
    unsafe {
        ndk_context::initialize_android_context(
            vm.get_java_vm_pointer().cast(),
            std::ptr::null_mut(),
        );
    }

    log::info!("Android context initialized successfully");

    jni::sys::JNI_VERSION_1_6
}
