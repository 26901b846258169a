use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by [`ZipStore`](crate::ZipStore) and
/// [`Entry`](crate::Entry) operations.
///
/// Misuse of the API is rejected before any state is mutated; format
/// violations are only produced while scanning an archive on open, which
/// fails closed without a partially populated entry set.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("archive is not open for writing")]
    ReadOnly,

    #[error("entry name must not be empty")]
    EmptyName,

    #[error("entry name is {0} bytes, longer than an archive can carry")]
    NameTooLong(usize),

    #[error("an entry named {0:?} already exists")]
    DuplicateEntry(String),

    #[error("entry is not writable")]
    NotWritable,

    #[error("entry has no payload offset")]
    UnsetOffset,

    #[error("cannot reposition an entry while it is being appended")]
    SeekWhileAppending,

    #[error("seek to {0} landed outside the entry payload")]
    SeekOutOfRange(u64),

    #[error("file is too short to be an archive")]
    TooShort,

    #[error("missing PK signature at start of file")]
    BadSignature,

    #[error("cannot locate the end of central directory record")]
    BadEndRecord,

    #[error("central directory is corrupt: {0}")]
    CorruptDirectory(&'static str),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        use io::ErrorKind;
        match err {
            Error::Io(e) => e,
            Error::DuplicateEntry(_) => io::Error::new(ErrorKind::AlreadyExists, err),
            Error::ReadOnly
            | Error::EmptyName
            | Error::NameTooLong(_)
            | Error::NotWritable
            | Error::UnsetOffset
            | Error::SeekWhileAppending
            | Error::SeekOutOfRange(_) => io::Error::new(ErrorKind::InvalidInput, err),
            Error::TooShort
            | Error::BadSignature
            | Error::BadEndRecord
            | Error::CorruptDirectory(_) => io::Error::new(ErrorKind::InvalidData, err),
        }
    }
}
