#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

pub type Result<T, E = MpaError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum MpaError {
    #[error("End of stream: {size} bytes at offset {offset} exceed stream size {len}")]
    EndOfStream { offset: u64, size: usize, len: u64 },

    #[error("Invalid frame header at offset {offset}: {source}")]
    Header {
        offset: u64,
        #[source]
        source: HeaderError,
    },

    #[error("No frame header found within tolerance of offset {0}")]
    NoFrameInTolerance(u64),

    #[error("No frame header found within {range} bytes of offset {offset}")]
    NoFrameInRange { offset: u64, range: u64 },

    #[error("Lyrics3 tag is corrupt: LYRICSBEGIN not found before offset {0}")]
    CorruptLyricsTag(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MpaError {
    /// `true` for candidate rejections a scanning loop may skip over.
    ///
    /// No rejected candidate can become a frame, so every header error
    /// qualifies. Only [`SyncMode::Exact`](crate::process::resync::SyncMode::Exact)
    /// reports them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Header { .. })
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream { .. })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("No frame sync, read {0:#06X}")]
    NoSync(u16),

    #[error("Reserved MPEG version")]
    ReservedVersion,

    #[error("Reserved layer")]
    ReservedLayer,

    #[error("Free bitrate streams are not supported")]
    FreeBitrate,

    #[error("Reserved bitrate index")]
    ReservedBitrate,

    #[error("Reserved sample rate index")]
    ReservedSampleRate,

    #[error("Reserved emphasis")]
    ReservedEmphasis,

    #[error("Layer II does not allow {bitrate} kbps in {mode} mode")]
    DisallowedLayer2Mode { bitrate: u32, mode: &'static str },

    #[error("Header is incompatible with the reference frame header")]
    Incompatible,
}
