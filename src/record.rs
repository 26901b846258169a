//! On-disk record layout for the ZIP subset this crate speaks.
//!
//! All records are fixed-size with little-endian fields, read and written
//! field by field so the layout stays byte-exact regardless of struct
//! representation. Signatures are kept as plain struct fields; callers
//! validate them against the `SIGNATURE` constants, since a mismatch means
//! something different on each read path.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// PKZIP 2.0, the version required to extract stored entries.
pub(crate) const VERSION_NEEDED: u16 = 20;
/// Compression method 0: payload bytes equal the original bytes.
pub(crate) const METHOD_STORED: u16 = 0;

/// Per-entry record written ahead of the payload. Sizes and checksum start
/// as zero and are patched in place once the entry is finalized.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalFileHeader {
    pub signature: u32,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// `PK\x03\x04`
    pub const SIGNATURE: u32 = 0x0403_4b50;
    pub const SIZE: u64 = 30;

    pub fn new(name_len: u16) -> LocalFileHeader {
        LocalFileHeader {
            signature: Self::SIGNATURE,
            version_needed: VERSION_NEEDED,
            flags: 0,
            method: METHOD_STORED,
            mod_time: 0,
            mod_date: 0,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            name_len,
            extra_len: 0,
        }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<LocalFileHeader> {
        Ok(LocalFileHeader {
            signature: reader.read_u32::<LittleEndian>()?,
            version_needed: reader.read_u16::<LittleEndian>()?,
            flags: reader.read_u16::<LittleEndian>()?,
            method: reader.read_u16::<LittleEndian>()?,
            mod_time: reader.read_u16::<LittleEndian>()?,
            mod_date: reader.read_u16::<LittleEndian>()?,
            crc32: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            uncompressed_size: reader.read_u32::<LittleEndian>()?,
            name_len: reader.read_u16::<LittleEndian>()?,
            extra_len: reader.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.signature)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.method)?;
        writer.write_u16::<LittleEndian>(self.mod_time)?;
        writer.write_u16::<LittleEndian>(self.mod_date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.name_len)?;
        writer.write_u16::<LittleEndian>(self.extra_len)
    }
}

/// Per-entry record in the trailing central directory, mirroring the local
/// header fields plus a back-pointer to it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CentralDirectoryRecord {
    pub signature: u32,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub mod_time: u16,
    pub mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
    pub comment_len: u16,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub header_offset: u32,
}

impl CentralDirectoryRecord {
    /// `PK\x01\x02`
    pub const SIGNATURE: u32 = 0x0201_4b50;
    pub const SIZE: u64 = 46;

    pub fn new(
        length: u32,
        name_len: u16,
        header_offset: u32,
        crc32: u32,
    ) -> CentralDirectoryRecord {
        CentralDirectoryRecord {
            signature: Self::SIGNATURE,
            version_made_by: VERSION_NEEDED,
            version_needed: VERSION_NEEDED,
            flags: 0,
            method: METHOD_STORED,
            mod_time: 0,
            mod_date: 0,
            crc32,
            compressed_size: length,
            uncompressed_size: length,
            name_len,
            extra_len: 0,
            comment_len: 0,
            disk_number_start: 1,
            internal_attrs: 0,
            external_attrs: 0,
            header_offset,
        }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<CentralDirectoryRecord> {
        Ok(CentralDirectoryRecord {
            signature: reader.read_u32::<LittleEndian>()?,
            version_made_by: reader.read_u16::<LittleEndian>()?,
            version_needed: reader.read_u16::<LittleEndian>()?,
            flags: reader.read_u16::<LittleEndian>()?,
            method: reader.read_u16::<LittleEndian>()?,
            mod_time: reader.read_u16::<LittleEndian>()?,
            mod_date: reader.read_u16::<LittleEndian>()?,
            crc32: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            uncompressed_size: reader.read_u32::<LittleEndian>()?,
            name_len: reader.read_u16::<LittleEndian>()?,
            extra_len: reader.read_u16::<LittleEndian>()?,
            comment_len: reader.read_u16::<LittleEndian>()?,
            disk_number_start: reader.read_u16::<LittleEndian>()?,
            internal_attrs: reader.read_u16::<LittleEndian>()?,
            external_attrs: reader.read_u32::<LittleEndian>()?,
            header_offset: reader.read_u32::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.signature)?;
        writer.write_u16::<LittleEndian>(self.version_made_by)?;
        writer.write_u16::<LittleEndian>(self.version_needed)?;
        writer.write_u16::<LittleEndian>(self.flags)?;
        writer.write_u16::<LittleEndian>(self.method)?;
        writer.write_u16::<LittleEndian>(self.mod_time)?;
        writer.write_u16::<LittleEndian>(self.mod_date)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        writer.write_u16::<LittleEndian>(self.name_len)?;
        writer.write_u16::<LittleEndian>(self.extra_len)?;
        writer.write_u16::<LittleEndian>(self.comment_len)?;
        writer.write_u16::<LittleEndian>(self.disk_number_start)?;
        writer.write_u16::<LittleEndian>(self.internal_attrs)?;
        writer.write_u32::<LittleEndian>(self.external_attrs)?;
        writer.write_u32::<LittleEndian>(self.header_offset)
    }
}

/// Fixed trailer locating and summarizing the central directory. Written at
/// the very end of the file; located at a fixed offset from end-of-file on
/// open, which is why no archive comment can be tolerated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EndOfCentralDirectory {
    pub signature: u32,
    pub disk_number: u16,
    pub directory_disk: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub directory_size: u32,
    pub directory_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// `PK\x05\x06`
    pub const SIGNATURE: u32 = 0x0605_4b50;
    pub const SIZE: u64 = 22;

    pub fn new(entries: u16, directory_size: u32, directory_offset: u32) -> EndOfCentralDirectory {
        EndOfCentralDirectory {
            signature: Self::SIGNATURE,
            disk_number: 0,
            directory_disk: 0,
            disk_entries: entries,
            total_entries: entries,
            directory_size,
            directory_offset,
            comment_len: 0,
        }
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<EndOfCentralDirectory> {
        Ok(EndOfCentralDirectory {
            signature: reader.read_u32::<LittleEndian>()?,
            disk_number: reader.read_u16::<LittleEndian>()?,
            directory_disk: reader.read_u16::<LittleEndian>()?,
            disk_entries: reader.read_u16::<LittleEndian>()?,
            total_entries: reader.read_u16::<LittleEndian>()?,
            directory_size: reader.read_u32::<LittleEndian>()?,
            directory_offset: reader.read_u32::<LittleEndian>()?,
            comment_len: reader.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.signature)?;
        writer.write_u16::<LittleEndian>(self.disk_number)?;
        writer.write_u16::<LittleEndian>(self.directory_disk)?;
        writer.write_u16::<LittleEndian>(self.disk_entries)?;
        writer.write_u16::<LittleEndian>(self.total_entries)?;
        writer.write_u32::<LittleEndian>(self.directory_size)?;
        writer.write_u32::<LittleEndian>(self.directory_offset)?;
        writer.write_u16::<LittleEndian>(self.comment_len)
    }
}
