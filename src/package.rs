//! Read LSPK v18 package files without needing any of the game's own
//! tooling — just enough of the format to pull one named member out.
//!
//! Header (40 bytes, little-endian):
//!   4B  signature         ("LSPK" = 0x4B50534C)
//!   4B  version           (18)
//!   8B  file_list_offset
//!   4B  file_list_size
//!   1B  flags
//!   1B  priority
//!  16B  md5
//!   2B  num_parts
//!
//! At `file_list_offset`: `u32 num_files`, `u32 compressed_size`, then
//! `compressed_size` bytes of LZ4 block-compressed data that decompress to
//! `num_files * 272` bytes — one 272-byte record per file:
//!   256B  name (NUL-terminated UTF-8, zero-padded)
//!    4B   offset_low
//!    2B   offset_high   (full offset = offset_low | (offset_high << 32))
//!    1B   archive_part
//!    1B   flags         (low nibble: 0=none, 1=zlib, 2=lz4)
//!    4B   size_on_disk
//!    4B   uncompressed_size

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use thiserror::Error;

const SIGNATURE: u32 = 0x4B50534C;
const VERSION: u32 = 18;
const HEADER_SIZE: usize = 40;
const ENTRY_SIZE: usize = 272;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("not an LSPK file: {0}")]
    BadFormat(String),
    #[error("unsupported LSPK compression method {method}")]
    UnsupportedCompression { method: u8 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

struct Header {
    file_list_offset: u64,
}

fn read_header(file: &mut File) -> Result<Header, PackageError> {
    let mut buf = [0u8; HEADER_SIZE];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf)
        .map_err(|_| PackageError::BadFormat("file too small to be an LSPK archive".into()))?;

    let signature = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    if signature != SIGNATURE {
        return Err(PackageError::BadFormat(format!(
            "bad signature 0x{signature:08X}"
        )));
    }
    let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(PackageError::BadFormat(format!(
            "unsupported LSPK version {version} (expected {VERSION})"
        )));
    }
    let file_list_offset = u64::from_le_bytes(buf[8..16].try_into().unwrap());
    Ok(Header { file_list_offset })
}

struct FileEntry {
    name: String,
    offset: u64,
    flags: u8,
    size_on_disk: u32,
    uncompressed_size: u32,
}

fn read_file_list(file: &mut File, header: &Header) -> Result<Vec<FileEntry>, PackageError> {
    file.seek(SeekFrom::Start(header.file_list_offset))?;
    let mut count_buf = [0u8; 4];
    file.read_exact(&mut count_buf)?;
    let num_files = u32::from_le_bytes(count_buf) as usize;

    let mut size_buf = [0u8; 4];
    file.read_exact(&mut size_buf)?;
    let compressed_size = u32::from_le_bytes(size_buf) as usize;

    let mut compressed = vec![0u8; compressed_size];
    file.read_exact(&mut compressed)?;

    let uncompressed_size = num_files * ENTRY_SIZE;
    let raw = lz4_flex::block::decompress(&compressed, uncompressed_size)
        .map_err(|_| PackageError::BadFormat("corrupt LSPK file list".into()))?;

    let mut entries = Vec::with_capacity(num_files);
    for i in 0..num_files {
        let base = i * ENTRY_SIZE;
        let record = &raw[base..base + ENTRY_SIZE];
        let name_bytes = &record[0..256];
        let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(256);
        let name = String::from_utf8_lossy(&name_bytes[..nul]).into_owned();

        let offset_low = u32::from_le_bytes(record[256..260].try_into().unwrap()) as u64;
        let offset_high = u16::from_le_bytes(record[260..262].try_into().unwrap()) as u64;
        let offset = offset_low | (offset_high << 32);
        let flags = record[263];
        let size_on_disk = u32::from_le_bytes(record[264..268].try_into().unwrap());
        let uncompressed_size = u32::from_le_bytes(record[268..272].try_into().unwrap());

        entries.push(FileEntry {
            name,
            offset,
            flags,
            size_on_disk,
            uncompressed_size,
        });
    }
    Ok(entries)
}

fn decompress(data: &[u8], flags: u8, uncompressed_size: u32) -> Result<Vec<u8>, PackageError> {
    match flags & 0x0F {
        0 => Ok(data.to_vec()),
        1 => {
            use std::io::Read as _;
            let mut decoder = flate2::read::ZlibDecoder::new(data);
            let mut out = Vec::with_capacity(uncompressed_size as usize);
            decoder.read_to_end(&mut out)?;
            Ok(out)
        }
        2 => lz4_flex::block::decompress(data, uncompressed_size as usize)
            .map_err(|_| PackageError::BadFormat("corrupt LSPK member".into())),
        method => Err(PackageError::UnsupportedCompression { method }),
    }
}

/// Extract the first member whose name ends with `suffix` (e.g.
/// `"meta.lsx"`). Returns `Ok(None)` if no member matches. Bytes are
/// returned as-is — callers that expect text (e.g. the `meta.lsx` XML a
/// dependency resolver reads) decode it themselves, since not every LSPK
/// member is UTF-8.
pub fn extract_named(pak_path: &Path, suffix: &str) -> Result<Option<Vec<u8>>, PackageError> {
    let mut file = File::open(pak_path)?;
    let header = read_header(&mut file)?;
    let entries = read_file_list(&mut file, &header)?;

    for entry in &entries {
        if !entry.name.ends_with(suffix) {
            continue;
        }
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut raw = vec![0u8; entry.size_on_disk as usize];
        file.read_exact(&mut raw)?;
        let content = decompress(&raw, entry.flags, entry.uncompressed_size)?;
        return Ok(Some(content));
    }
    Ok(None)
}

/// List every member name in the package, in file-table order.
pub fn list_names(pak_path: &Path) -> Result<Vec<String>, PackageError> {
    let mut file = File::open(pak_path)?;
    let header = read_header(&mut file)?;
    Ok(read_file_list(&mut file, &header)?
        .into_iter()
        .map(|e| e.name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// `(name, uncompressed bytes, compression flag)`. Flag 0 stores the
    /// bytes verbatim; 1 zlib-compresses them; 2 LZ4-block-compresses them.
    fn write_test_pak_compressed(path: &Path, members: &[(&str, &[u8], u8)]) {
        let mut records = Vec::new();
        let mut data_section = Vec::new();
        let header_and_later_offset_base = HEADER_SIZE as u64;

        let mut running_offset = header_and_later_offset_base;
        for (name, bytes, flag) in members {
            let on_disk = match flag {
                1 => {
                    use std::io::Write as _;
                    let mut enc =
                        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                    enc.write_all(bytes).unwrap();
                    enc.finish().unwrap()
                }
                2 => lz4_flex::block::compress(bytes),
                _ => bytes.to_vec(),
            };
            let mut name_buf = [0u8; 256];
            name_buf[..name.len()].copy_from_slice(name.as_bytes());
            records.extend_from_slice(&name_buf);
            records.extend_from_slice(&(running_offset as u32).to_le_bytes()); // offset_low
            records.extend_from_slice(&((running_offset >> 32) as u16).to_le_bytes()); // offset_high
            records.push(0); // archive_part
            records.push(*flag);
            records.extend_from_slice(&(on_disk.len() as u32).to_le_bytes()); // size_on_disk
            records.extend_from_slice(&(bytes.len() as u32).to_le_bytes()); // uncompressed_size
            running_offset += on_disk.len() as u64;
            data_section.extend_from_slice(&on_disk);
        }

        finish_test_pak(path, records, data_section, members.len());
    }

    fn write_test_pak(path: &Path, members: &[(&str, &[u8])]) {
        let mut records = Vec::new();
        let mut data_section = Vec::new();
        let header_and_later_offset_base = HEADER_SIZE as u64;

        // We lay out: header, then raw member bytes back-to-back, then the
        // file list at the very end (offset computed after we know its size).
        let mut running_offset = header_and_later_offset_base;
        for (name, bytes) in members {
            let mut name_buf = [0u8; 256];
            name_buf[..name.len()].copy_from_slice(name.as_bytes());
            records.extend_from_slice(&name_buf);
            records.extend_from_slice(&(running_offset as u32).to_le_bytes()); // offset_low
            records.extend_from_slice(&((running_offset >> 32) as u16).to_le_bytes()); // offset_high
            records.push(0); // archive_part
            records.push(0); // flags: none
            records.extend_from_slice(&(bytes.len() as u32).to_le_bytes()); // size_on_disk
            records.extend_from_slice(&(bytes.len() as u32).to_le_bytes()); // uncompressed_size
            data_section.extend_from_slice(bytes);
            running_offset += bytes.len() as u64;
        }

        finish_test_pak(path, records, data_section, members.len());
    }

    fn finish_test_pak(path: &Path, records: Vec<u8>, data_section: Vec<u8>, num_files: usize) {
        let compressed_list = lz4_flex::block::compress(&records);
        let file_list_offset = HEADER_SIZE as u64 + data_section.len() as u64;

        let mut out = Vec::new();
        out.extend_from_slice(&SIGNATURE.to_le_bytes());
        out.extend_from_slice(&18u32.to_le_bytes());
        out.extend_from_slice(&file_list_offset.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // file_list_size, unused by reader
        out.push(0); // flags
        out.push(0); // priority
        out.extend_from_slice(&[0u8; 16]); // md5
        out.extend_from_slice(&0u16.to_le_bytes()); // num_parts
        out.extend_from_slice(&data_section);
        out.extend_from_slice(&(num_files as u32).to_le_bytes());
        out.extend_from_slice(&(compressed_list.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed_list);

        let mut f = File::create(path).unwrap();
        f.write_all(&out).unwrap();
    }

    #[test]
    fn extracts_named_member() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.pak");
        write_test_pak(&path, &[("Mods/Example/meta.lsx", b"<meta/>")]);

        let found = extract_named(&path, "meta.lsx").unwrap();
        assert_eq!(found, Some(b"<meta/>".to_vec()));
    }

    #[test]
    fn missing_member_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.pak");
        write_test_pak(&path, &[("Public/Other.txt", b"x")]);

        assert_eq!(extract_named(&path, "meta.lsx").unwrap(), None);
    }

    #[test]
    fn rejects_bad_signature() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.pak");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let err = extract_named(&path, "meta.lsx").unwrap_err();
        assert!(matches!(err, PackageError::BadFormat(_)));
    }

    #[test]
    fn rejects_wrong_version() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("old.pak");
        write_test_pak(&path, &[("Mods/Example/meta.lsx", b"<meta/>")]);

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[4..8].copy_from_slice(&17u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = extract_named(&path, "meta.lsx").unwrap_err();
        assert!(matches!(err, PackageError::BadFormat(_)));
    }

    #[test]
    fn lists_all_member_names() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.pak");
        write_test_pak(
            &path,
            &[("A/meta.lsx", b"a"), ("B/meta.lsx", b"b")],
        );
        let names = list_names(&path).unwrap();
        assert_eq!(names, vec!["A/meta.lsx".to_string(), "B/meta.lsx".to_string()]);
    }

    #[test]
    fn extracts_zlib_compressed_member() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.pak");
        let payload = b"<meta>zlib payload repeated repeated repeated</meta>";
        write_test_pak_compressed(&path, &[("Mods/Example/meta.lsx", payload, 1)]);

        let found = extract_named(&path, "meta.lsx").unwrap();
        assert_eq!(found, Some(payload.to_vec()));
    }

    #[test]
    fn extracts_lz4_compressed_member() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.pak");
        let payload = b"<meta>lz4 payload repeated repeated repeated</meta>";
        write_test_pak_compressed(&path, &[("Mods/Example/meta.lsx", payload, 2)]);

        let found = extract_named(&path, "meta.lsx").unwrap();
        assert_eq!(found, Some(payload.to_vec()));
    }

    #[test]
    fn rejects_unknown_compression_method() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test.pak");
        write_test_pak_compressed(&path, &[("Mods/Example/meta.lsx", b"irrelevant", 9)]);

        let err = extract_named(&path, "meta.lsx").unwrap_err();
        assert!(matches!(err, PackageError::UnsupportedCompression { method: 9 }));
    }
}
