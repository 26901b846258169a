use std::io::{self, Read, Seek, SeekFrom, Write};

use crc32fast::Hasher;

use crate::error::{Error, Result};
use crate::store::ZipStore;

/// Per-name cursor state, owned by the container's entries map.
///
/// `data_offset` of zero means the payload offset was never assigned and the
/// record is unusable. The hasher is present only while the record is the
/// single actively appending entry; it is folded into `crc` on finalize.
pub(crate) struct EntryRecord {
    pub(crate) header_offset: u64,
    pub(crate) data_offset: u64,
    pub(crate) length: u64,
    pub(crate) position: u64,
    pub(crate) can_write: bool,
    pub(crate) can_extend: bool,
    pub(crate) crc: u32,
    pub(crate) hasher: Option<Hasher>,
}

/// A positioned read/write cursor over one named byte range of a
/// [`ZipStore`].
///
/// The handle borrows the container mutably, so it cannot outlive it and no
/// two entries can be operated on at once. Obtain one from
/// [`ZipStore::get_entry`] or [`ZipStore::new_entry`]; the cursor position
/// persists in the container across lookups.
pub struct Entry<'a> {
    pub(crate) store: &'a mut ZipStore,
    pub(crate) name: String,
}

impl Entry<'_> {
    fn record(&self) -> &EntryRecord {
        &self.store.entries[&self.name]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload size in bytes. Fixed for entries loaded from an archive,
    /// grows while this entry is being appended.
    pub fn len(&self) -> u64 {
        self.record().length
    }

    pub fn is_empty(&self) -> bool {
        self.record().length == 0
    }

    /// Cursor position relative to the start of the payload.
    pub fn position(&self) -> u64 {
        self.record().position
    }

    /// Finalized CRC-32 of the payload. Zero while the entry is still being
    /// appended; populated from the central directory for read entries.
    pub fn crc32(&self) -> u32 {
        self.record().crc
    }

    /// Moves the cursor to `pos`, clamped into `[0, len]`.
    ///
    /// While this entry is the active streaming writer only a seek to the
    /// current position succeeds: the running checksum cannot be recomputed
    /// for out-of-order writes.
    pub fn seek(&mut self, pos: u64) -> Result<u64> {
        let rec = self.store.entries.get_mut(&self.name).unwrap();
        if rec.data_offset == 0 {
            return Err(Error::UnsetOffset);
        }
        if rec.can_extend && pos != rec.position {
            return Err(Error::SeekWhileAppending);
        }

        let pos = pos.min(rec.length);
        let landed = self.store.file.seek(SeekFrom::Start(rec.data_offset + pos))?;
        let landed = landed
            .checked_sub(rec.data_offset)
            .ok_or(Error::SeekOutOfRange(pos))?;
        if landed > rec.length {
            return Err(Error::SeekOutOfRange(pos));
        }

        rec.position = landed;
        Ok(landed)
    }

    /// Reads up to `buf.len()` bytes at the cursor, never past the end of
    /// the payload. Returns `Ok(0)` once the cursor reaches the end.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let rec = self.record();
        if rec.data_offset == 0 {
            return Err(Error::UnsetOffset);
        }
        let (position, length) = (rec.position, rec.length);
        if position >= length {
            return Ok(0);
        }

        let want = ((length - position) as usize).min(buf.len());
        if want == 0 {
            return Ok(0);
        }

        self.seek(position)?;
        let n = self.store.file.read(&mut buf[..want])?;

        let rec = self.store.entries.get_mut(&self.name).unwrap();
        rec.position += n as u64;
        Ok(n)
    }

    /// Writes `buf` at the cursor.
    ///
    /// While extending, the full buffer is appended and the payload grows
    /// with the cursor. On a finalized but still writable entry the write is
    /// capped at the remaining payload (fixed-size overwrite semantics), and
    /// `Ok(0)` is returned at the end of the payload. Every byte written is
    /// folded into the running checksum.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let rec = self.record();
        if rec.data_offset == 0 {
            return Err(Error::UnsetOffset);
        }
        if !rec.can_write {
            return Err(Error::NotWritable);
        }
        if rec.position > rec.length {
            return Ok(0);
        }
        if rec.position == rec.length && !rec.can_extend {
            return Ok(0);
        }

        let want = if rec.can_extend {
            buf.len()
        } else {
            ((rec.length - rec.position) as usize).min(buf.len())
        };
        if want == 0 {
            return Ok(0);
        }

        let position = rec.position;
        self.seek(position)?;
        self.store.file.write_all(&buf[..want])?;

        let rec = self.store.entries.get_mut(&self.name).unwrap();
        rec.position += want as u64;
        if let Some(hasher) = rec.hasher.as_mut() {
            hasher.update(&buf[..want]);
        }
        if rec.can_extend && rec.length < rec.position {
            rec.length = rec.position;
        }
        Ok(want)
    }
}

impl Read for Entry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Entry::read(self, buf).map_err(Into::into)
    }
}

impl Write for Entry<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Entry::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.store.file.flush()
    }
}

impl Seek for Entry<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (position, length) = {
            let rec = self.record();
            (rec.position, rec.length)
        };
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::End(n) => i128::from(length) + i128::from(n),
            SeekFrom::Current(n) => i128::from(position) + i128::from(n),
        };
        let target = u64::try_from(target).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of entry")
        })?;
        Entry::seek(self, target).map_err(Into::into)
    }
}
