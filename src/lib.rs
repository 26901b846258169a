//! A minimal stored-only ZIP container for named state streams.
//!
//! This crate writes one or more named, uncompressed byte streams
//! sequentially into a single file and can later re-open that file to
//! randomly read back any named stream. The on-disk layout is a byte-exact
//! subset of the PKZIP format (local file headers, a central directory and
//! an end-of-central-directory record), so the archives it produces open in
//! ordinary ZIP tools, but it only promises to read back archives it wrote
//! itself: no compression, no multi-disk archives, no archive comment.
//!
//! Use [`ZipStore::open`] with [`OpenMode::ReadWrite`] to append entries via
//! [`ZipStore::new_entry`], finishing with [`ZipStore::write_footer`]; open
//! with [`OpenMode::Read`] to get positioned read cursors back out of
//! [`ZipStore::get_entry`].

mod entry;
mod error;
mod record;
mod store;

pub use entry::Entry;
pub use error::{Error, Result};
pub use store::{OpenMode, ZipStore};
