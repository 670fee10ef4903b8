use thiserror::Error;

/// Failures the audio paths can surface to the user. Everything here is
/// recoverable: the app reports it on the status line and keeps running.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no usable audio device")]
    DeviceUnavailable,

    #[error("the host refused access to the audio device")]
    AccessDenied,

    #[error("unsupported or corrupt audio data: {0}")]
    Decode(#[from] hound::Error),

    #[error("audio output is not initialized")]
    NotInitialized,

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("all {0} clip slots are taken")]
    BankFull(usize),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        use cpal::BuildStreamError::*;
        match err {
            DeviceNotAvailable => AudioError::DeviceUnavailable,
            BackendSpecific { err } => {
                let msg = err.description.to_lowercase();
                if msg.contains("denied") || msg.contains("permission") {
                    AudioError::AccessDenied
                } else {
                    AudioError::Stream(err.description)
                }
            }
            other => AudioError::Stream(other.to_string()),
        }
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        use cpal::DefaultStreamConfigError::*;
        match err {
            DeviceNotAvailable => AudioError::DeviceUnavailable,
            StreamTypeNotSupported => {
                AudioError::Stream(String::from("stream type not supported"))
            }
            BackendSpecific { err } => AudioError::Stream(err.description),
        }
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        use cpal::PlayStreamError::*;
        match err {
            DeviceNotAvailable => AudioError::DeviceUnavailable,
            BackendSpecific { err } => AudioError::Stream(err.description),
        }
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        use cpal::PauseStreamError::*;
        match err {
            DeviceNotAvailable => AudioError::DeviceUnavailable,
            BackendSpecific { err } => AudioError::Stream(err.description),
        }
    }
}
