use std::collections::BTreeMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;

use crate::entry::{Entry, EntryRecord};
use crate::error::{Error, Result};
use crate::record::{CentralDirectoryRecord, EndOfCentralDirectory, LocalFileHeader};

/// Smallest file we will even attempt to scan as an archive.
const MIN_ARCHIVE_LEN: u64 = 64;
/// Upper sanity bound on the declared central directory size.
const MAX_DIRECTORY_LEN: u32 = 0x10_0000;
/// Longest filename accepted from an untrusted central directory.
const MAX_NAME_LEN: usize = 512;

/// How an archive is opened. Write-only access is not supported: finalizing
/// an entry has to read its local header back to patch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Scan the central directory and expose existing entries for reading.
    Read,
    /// Start a fresh writer session, appending entries at end-of-file. Any
    /// existing content is truncated; the directory is never scanned.
    ReadWrite,
}

/// Single-writer bookkeeping: at most one entry is ever appending.
#[derive(Debug)]
enum WriterState {
    Idle,
    Appending(String),
}

/// An archive container over one file: a map of named entries, scanned from
/// the central directory in read mode or built up by appending in write
/// mode.
///
/// Writer sessions follow a strict protocol: [`new_entry`](Self::new_entry)
/// finalizes whatever entry was appending before starting the next one, and
/// [`write_footer`](Self::write_footer) finalizes the last entry and emits
/// the central directory exactly once. Dropping the container releases the
/// file handle.
pub struct ZipStore {
    pub(crate) file: File,
    path: PathBuf,
    writable: bool,
    state: WriterState,
    trailer_written: bool,
    pub(crate) entries: BTreeMap<String, EntryRecord>,
}

impl fmt::Debug for ZipStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipStore")
            .field("path", &self.path)
            .field("writable", &self.writable)
            .field("entries", &self.entries.len())
            .field("trailer_written", &self.trailer_written)
            .finish_non_exhaustive()
    }
}

impl Drop for ZipStore {
    fn drop(&mut self) {
        if self.writable && !self.trailer_written {
            tracing::warn!(
                "archive at {:?} dropped without a central directory; it will not reopen",
                self.path
            );
        }
    }
}

impl ZipStore {
    /// Opens `path` in the given mode.
    ///
    /// In [`OpenMode::Read`] the archive structure is validated and the
    /// central directory scanned into the entries map; any structural
    /// violation fails the open with the file released and no partially
    /// populated container. In [`OpenMode::ReadWrite`] the file is created
    /// or truncated and the session starts with an empty entries map.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<ZipStore> {
        let path = path.as_ref();
        let mut file = match mode {
            OpenMode::Read => OpenOptions::new().read(true).open(path)?,
            OpenMode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        };

        let entries = match mode {
            OpenMode::Read => scan_directory(&mut file)?,
            OpenMode::ReadWrite => BTreeMap::new(),
        };

        Ok(ZipStore {
            file,
            path: path.to_path_buf(),
            writable: mode == OpenMode::ReadWrite,
            state: WriterState::Idle,
            trailer_written: false,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Number of entries currently known to the container.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names in archive (directory) order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns a cursor over an existing entry, or `None` for an absent or
    /// empty name. The cursor position persists across lookups.
    pub fn get_entry(&mut self, name: &str) -> Option<Entry<'_>> {
        if name.is_empty() || !self.entries.contains_key(name) {
            return None;
        }
        Some(Entry {
            store: self,
            name: name.to_string(),
        })
    }

    /// Appends a new entry and returns its live write cursor.
    ///
    /// Whatever entry was appending before is finalized first. The new
    /// entry's local header is written with zeroed sizes and checksum, to be
    /// patched when it is finalized in turn; the cursor starts at the
    /// beginning of the (empty) payload in extend mode.
    pub fn new_entry(&mut self, name: &str) -> Result<Entry<'_>> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if name.len() >= MAX_NAME_LEN {
            return Err(Error::NameTooLong(name.len()));
        }
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateEntry(name.to_string()));
        }

        self.close_current()?;

        let header_offset = self.file.seek(SeekFrom::End(0))?;
        let record = EntryRecord {
            header_offset,
            data_offset: header_offset + LocalFileHeader::SIZE + name.len() as u64,
            length: 0,
            position: 0,
            can_write: true,
            can_extend: true,
            crc: 0,
            hasher: Some(Hasher::new()),
        };
        self.entries.insert(name.to_string(), record);
        self.state = WriterState::Appending(name.to_string());

        if let Err(err) = self.write_local_header(header_offset, name) {
            // The header is incomplete; abort the entry without patching it.
            self.abort_current();
            return Err(err.into());
        }

        tracing::debug!(name, offset = header_offset, "started entry");
        Ok(Entry {
            store: self,
            name: name.to_string(),
        })
    }

    fn write_local_header(&mut self, header_offset: u64, name: &str) -> std::io::Result<()> {
        self.file.seek(SeekFrom::Start(header_offset))?;
        LocalFileHeader::new(name.len() as u16).write_to(&mut self.file)?;
        self.file.write_all(name.as_bytes())?;
        // The file cursor now sits at the payload start.
        Ok(())
    }

    fn abort_current(&mut self) {
        if let WriterState::Appending(name) = std::mem::replace(&mut self.state, WriterState::Idle)
        {
            if let Some(record) = self.entries.get_mut(&name) {
                record.can_write = false;
                record.can_extend = false;
                record.hasher = None;
            }
        }
    }

    /// Finalizes the actively appending entry, if any: freezes its length,
    /// finalizes the checksum, and patches both into the local header
    /// written by [`new_entry`](Self::new_entry).
    ///
    /// The writer state returns to idle even when the patch fails, so a
    /// failed finalize never wedges the session.
    pub fn close_current(&mut self) -> Result<()> {
        if !self.writable {
            return Ok(());
        }
        let name = match std::mem::replace(&mut self.state, WriterState::Idle) {
            WriterState::Idle => return Ok(()),
            WriterState::Appending(name) => name,
        };
        let Some(record) = self.entries.get_mut(&name) else {
            return Ok(());
        };
        if !record.can_write {
            return Ok(());
        }

        record.can_write = false;
        record.can_extend = false;
        record.crc = record.hasher.take().map(Hasher::finalize).unwrap_or(0);
        let (header_offset, length, crc) = (record.header_offset, record.length, record.crc);

        self.file.seek(SeekFrom::Start(header_offset))?;
        let mut header = LocalFileHeader::read_from(&mut self.file)?;
        if header.signature != LocalFileHeader::SIGNATURE {
            return Err(Error::CorruptDirectory("local header overwritten"));
        }
        header.compressed_size = length as u32;
        header.uncompressed_size = length as u32;
        header.crc32 = crc;
        self.file.seek(SeekFrom::Start(header_offset))?;
        header.write_to(&mut self.file)?;

        tracing::debug!(name = %name, length, crc, "finalized entry");
        Ok(())
    }

    /// Finalizes the last entry and emits the central directory and its end
    /// record. Runs at most once per session; a no-op on a read-only
    /// container or after it has already run.
    ///
    /// On failure no trailer is recorded as written and the archive is left
    /// incomplete: it will not reopen in read mode.
    pub fn write_footer(&mut self) -> Result<()> {
        if self.trailer_written || !self.writable {
            return Ok(());
        }

        self.close_current()?;
        let directory_offset = self.file.seek(SeekFrom::End(0))?;

        let mut count: u16 = 0;
        let mut directory_size: u32 = 0;
        for (name, record) in &self.entries {
            let header = CentralDirectoryRecord::new(
                record.length as u32,
                name.len() as u16,
                record.header_offset as u32,
                record.crc,
            );
            header.write_to(&mut self.file)?;
            self.file.write_all(name.as_bytes())?;
            directory_size += CentralDirectoryRecord::SIZE as u32 + name.len() as u32;
            count += 1;
        }

        EndOfCentralDirectory::new(count, directory_size, directory_offset as u32)
            .write_to(&mut self.file)?;
        self.trailer_written = true;

        tracing::debug!(
            entries = count,
            directory_size,
            directory_offset,
            "wrote central directory"
        );
        Ok(())
    }

    /// Releases the file handle and discards the entries map. Equivalent to
    /// dropping the container; provided for symmetry with [`open`](Self::open).
    pub fn close(self) {
        drop(self);
    }
}

/// Validates the archive structure and walks the central directory into an
/// entries map. Only archives this crate wrote are expected to scan; any
/// deviation is a hard error, never a partial entry set.
fn scan_directory(file: &mut File) -> Result<BTreeMap<String, EntryRecord>> {
    let len = file.seek(SeekFrom::End(0))?;
    if len < MIN_ARCHIVE_LEN {
        return Err(Error::TooShort);
    }

    file.seek(SeekFrom::Start(0))?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if magic != *b"PK\x03\x04" {
        return Err(Error::BadSignature);
    }

    file.seek(SeekFrom::Start(len - EndOfCentralDirectory::SIZE))?;
    let end = EndOfCentralDirectory::read_from(file)?;
    if end.signature != EndOfCentralDirectory::SIGNATURE
        || end.directory_size > MAX_DIRECTORY_LEN
        || end.directory_offset == 0
        || u64::from(end.directory_offset) >= len
    {
        return Err(Error::BadEndRecord);
    }

    file.seek(SeekFrom::Start(end.directory_offset.into()))?;

    let mut entries = BTreeMap::new();
    let mut remain = i64::from(end.directory_size);
    while remain >= CentralDirectoryRecord::SIZE as i64 {
        let record = CentralDirectoryRecord::read_from(file)?;
        remain -= CentralDirectoryRecord::SIZE as i64;

        if record.signature != CentralDirectoryRecord::SIGNATURE {
            return Err(Error::CorruptDirectory("bad record signature"));
        }
        let name_len = usize::from(record.name_len);
        if name_len >= MAX_NAME_LEN {
            return Err(Error::CorruptDirectory("filename too long"));
        }

        let mut name = vec![0u8; name_len];
        if name_len != 0 {
            file.read_exact(&mut name)?;
            remain -= name_len as i64;
        }
        let name = String::from_utf8(name)
            .map_err(|_| Error::CorruptDirectory("filename is not UTF-8"))?;
        if name.is_empty() {
            continue;
        }

        let header_offset = u64::from(record.header_offset);
        let entry = EntryRecord {
            header_offset,
            data_offset: header_offset
                + LocalFileHeader::SIZE
                + u64::from(record.name_len)
                + u64::from(record.extra_len),
            length: u64::from(record.uncompressed_size),
            position: 0,
            can_write: false,
            can_extend: false,
            crc: record.crc32,
            hasher: None,
        };
        tracing::debug!(name = %name, length = entry.length, offset = header_offset, "scanned entry");
        entries.insert(name, entry);
    }

    tracing::debug!(count = entries.len(), "central directory scanned");
    Ok(entries)
}
