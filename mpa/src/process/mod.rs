/// File-level orchestration: first frame, VBR header, duration, navigation.
///
/// Provides [`MpaFile`](file::MpaFile) and [`FrameRequest`](file::FrameRequest).
pub mod file;

/// Frame header search around an offset.
///
/// Provides [`resync`](resync::resync) and its [`SyncMode`](resync::SyncMode)s.
pub mod resync;

/// Tag detection at both ends of a stream.
///
/// Provides the [`TagChain`](tags::TagChain) that trims tags off the audio range.
pub mod tags;

/// Behaviour shared by the parsing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Diagnostics at or above this severity become errors instead of log
    /// records. The advisory checks report at [`log::Level::Warn`].
    pub fail_level: log::Level,
    /// Probe for a compatible frame right after every frame found.
    pub check_subsequent: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
            check_subsequent: true,
        }
    }
}
