use crate::PaintId;

/// The broad category of an [`Error`].
///
/// Every fallible canvas operation reports one of these four conditions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A structural precondition is unmet: no render target,
    /// engine not initialized, or the backend refused the call.
    NotReady,
    /// An identity lookup failed.
    NotFound,
    /// An invalid paint was supplied where ownership is transferred.
    Corruption,
    /// The arguments are individually valid but cannot be combined.
    InvalidArgument,
}

/// Error returned by canvas, scene, and engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no render target is configured")]
    NoTarget,
    #[error("the engine is not initialized for {0:?} backends")]
    EngineNotInitialized(crate::BackendKind),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("paint {0:?} is not owned by this container")]
    NotFound(PaintId),
    #[error("invalid paint: {0}")]
    Corruption(&'static str),
    #[error("paint {0:?} cannot be positioned relative to itself")]
    SelfReference(PaintId),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoTarget | Error::EngineNotInitialized(_) | Error::Backend(_) => {
                ErrorKind::NotReady
            }
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Corruption(_) => ErrorKind::Corruption,
            Error::SelfReference(_) => ErrorKind::InvalidArgument,
        }
    }
}

/// Error returned by a [`Backend`](crate::Backend) call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("no render target is configured")]
    NoTarget,
    #[error("invalid render target dimensions {width}x{height}")]
    InvalidTarget { width: u32, height: u32 },
    #[error("paint has not been prepared for rendering")]
    NotPrepared,
    #[error("render key does not belong to this backend")]
    StaleKey,
    #[error("a frame is already in progress")]
    FrameInProgress,
    #[error("no frame is in progress")]
    NoFrame,
    #[error("background preparation did not complete")]
    TaskFailed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::NoTarget.kind(), ErrorKind::NotReady);
        assert_eq!(
            Error::from(BackendError::NotPrepared).kind(),
            ErrorKind::NotReady
        );
        assert_eq!(Error::Corruption("bad").kind(), ErrorKind::Corruption);
    }

    #[test]
    fn backend_errors_display_transparently() {
        let err = Error::from(BackendError::InvalidTarget {
            width: 0,
            height: 10,
        });
        assert_eq!(err.to_string(), "invalid render target dimensions 0x10");
    }
}
