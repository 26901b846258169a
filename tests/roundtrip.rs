//! End-to-end tests over real archive files: write a session, emit the
//! footer, reopen read-only, and verify what comes back out.

use std::path::PathBuf;

use tempfile::TempDir;
use zipstore::{OpenMode, ZipStore};

fn archive_path(dir: &TempDir) -> PathBuf {
    dir.path().join("archive.zip")
}

#[test]
fn round_trip_preserves_names_lengths_and_bytes() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let payloads: Vec<(&str, Vec<u8>)> = vec![
        ("CPU.BIN", (0..=255).cycle().take(4096).collect()),
        ("VGA.BIN", vec![0xAB; 333]),
        ("empty.dat", Vec::new()),
        ("notes.txt", b"plain text payload".to_vec()),
    ];

    {
        let mut store = ZipStore::open(&path, OpenMode::ReadWrite).unwrap();
        for (name, payload) in &payloads {
            let mut entry = store.new_entry(name).unwrap();
            // Split the payload over several writes to exercise streaming.
            for chunk in payload.chunks(1000) {
                assert_eq!(entry.write(chunk).unwrap(), chunk.len());
            }
        }
        store.write_footer().unwrap();
    }

    let mut store = ZipStore::open(&path, OpenMode::Read).unwrap();
    assert_eq!(store.len(), payloads.len());
    let names: Vec<&str> = store.entry_names().collect();
    assert_eq!(names, ["CPU.BIN", "VGA.BIN", "empty.dat", "notes.txt"]);

    for (name, payload) in &payloads {
        let mut entry = store.get_entry(name).unwrap();
        assert_eq!(entry.len(), payload.len() as u64);

        let mut buf = vec![0u8; payload.len()];
        let mut total = 0;
        while total < buf.len() {
            let n = entry.read(&mut buf[total..]).unwrap();
            assert_ne!(n, 0, "short read on {name}");
            total += n;
        }
        assert_eq!(&buf, payload, "payload mismatch on {name}");
        assert_eq!(entry.read(&mut [0u8; 16]).unwrap(), 0);
    }
}

#[test]
fn finalized_checksum_matches_crc32_of_payload() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    let payload: Vec<u8> = (0u32..2000).map(|i| (i * 7) as u8).collect();

    {
        let mut store = ZipStore::open(&path, OpenMode::ReadWrite).unwrap();
        let mut entry = store.new_entry("blob").unwrap();
        entry.write(&payload).unwrap();
        store.write_footer().unwrap();
    }

    let mut store = ZipStore::open(&path, OpenMode::Read).unwrap();
    let entry = store.get_entry("blob").unwrap();
    assert_eq!(entry.crc32(), crc32fast::hash(&payload));
}

#[test]
fn state_capture_scenario() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.dat");

    {
        let mut store = ZipStore::open(&path, OpenMode::ReadWrite).unwrap();
        let mut entry = store.new_entry("STATE.BIN").unwrap();
        assert_eq!(entry.write(&[0x58; 100]).unwrap(), 100);
        store.write_footer().unwrap();
        store.close();
    }

    let mut store = ZipStore::open(&path, OpenMode::Read).unwrap();
    let mut entry = store.get_entry("STATE.BIN").unwrap();
    assert_eq!(entry.len(), 100);

    let mut buf = [0u8; 100];
    assert_eq!(entry.read(&mut buf).unwrap(), 100);
    assert!(buf.iter().all(|&b| b == 0x58));
    assert_eq!(entry.read(&mut buf).unwrap(), 0);
}

#[test]
fn archives_carry_the_expected_zip_markers() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    {
        let mut store = ZipStore::open(&path, OpenMode::ReadWrite).unwrap();
        store.new_entry("x").unwrap().write(&[0u8; 64]).unwrap();
        store.write_footer().unwrap();
    }

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..4], b"PK\x03\x04");
    // End record sits exactly 22 bytes from end-of-file: no comment field.
    assert_eq!(&bytes[bytes.len() - 22..bytes.len() - 18], b"PK\x05\x06");
    // One entry on this disk and in total.
    assert_eq!(&bytes[bytes.len() - 14..bytes.len() - 10], &[1, 0, 1, 0]);
}

#[test]
fn reading_persists_cursor_across_lookups() {
    let dir = TempDir::new().unwrap();
    let path = archive_path(&dir);

    {
        let mut store = ZipStore::open(&path, OpenMode::ReadWrite).unwrap();
        store
            .new_entry("seq")
            .unwrap()
            .write(b"abcdefgh")
            .unwrap();
        store.write_footer().unwrap();
    }

    let mut store = ZipStore::open(&path, OpenMode::Read).unwrap();
    let mut buf = [0u8; 4];

    assert_eq!(store.get_entry("seq").unwrap().read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"abcd");
    // A fresh lookup picks up where the last one left off.
    assert_eq!(store.get_entry("seq").unwrap().read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"efgh");
}
