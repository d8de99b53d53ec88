//! File system helpers: encoding-aware source reading and atomic writes.
use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Byte encoding a source file was read with; the file is written back the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
}

impl SourceEncoding {
    /// Encodes `text` for writing, byte order mark included.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            SourceEncoding::Utf8 => text.as_bytes().to_vec(),
            SourceEncoding::Utf8Bom => {
                let mut bytes = Vec::with_capacity(text.len() + 3);
                bytes.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
            // encoding_rs only decodes UTF-16
            SourceEncoding::Utf16Le => std::iter::once(0xFEFF)
                .chain(text.encode_utf16())
                .flat_map(u16::to_le_bytes)
                .collect(),
            SourceEncoding::Utf16Be => std::iter::once(0xFEFF)
                .chain(text.encode_utf16())
                .flat_map(u16::to_be_bytes)
                .collect(),
        }
    }
}

/// Decoded source text plus what is needed to write it back faithfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub text: String,
    pub encoding: SourceEncoding,
}

impl SourceText {
    /// In-memory UTF-8 text without a byte order mark.
    pub fn utf8(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            encoding: SourceEncoding::Utf8,
        }
    }
}

/// Reads a source file, detecting UTF-16 by BOM and stripping a UTF-8 BOM.
pub fn read_source_file(path: &Path) -> std::io::Result<SourceText> {
    let bytes = fs::read(path)?;

    let decode_utf16 = |encoding: &'static encoding_rs::Encoding, source_encoding| {
        let (decoded, _, had_errors) = encoding.decode(&bytes);
        if had_errors {
            tracing::warn!("Errors detected while decoding {} file {}", encoding.name(), path.display());
        }
        SourceText {
            text: decoded.trim_start_matches('\u{FEFF}').to_string(),
            encoding: source_encoding,
        }
    };

    match bytes.as_slice() {
        [0xFF, 0xFE, ..] => Ok(decode_utf16(encoding_rs::UTF_16LE, SourceEncoding::Utf16Le)),
        [0xFE, 0xFF, ..] => Ok(decode_utf16(encoding_rs::UTF_16BE, SourceEncoding::Utf16Be)),
        _ => {
            let text = String::from_utf8(bytes)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            match text.strip_prefix('\u{FEFF}') {
                Some(rest) => Ok(SourceText {
                    text: rest.to_string(),
                    encoding: SourceEncoding::Utf8Bom,
                }),
                None => Ok(SourceText::utf8(text)),
            }
        }
    }
}

/// Writes `contents` to `path` in `encoding` through a temp file in the same
/// directory, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &str, encoding: SourceEncoding) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&encoding.encode(contents))?;
    tmp.as_file().sync_all()?;

    // Keep the permissions of the file being replaced
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_strips_and_remembers_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("A.java");
        fs::write(&path, "\u{FEFF}class A {}").unwrap();

        let source = read_source_file(&path).unwrap();
        assert_eq!(source.text, "class A {}");
        assert_eq!(source.encoding, SourceEncoding::Utf8Bom);

        write_atomic(&path, &source.text, source.encoding).unwrap();
        assert_eq!(fs::read(&path).unwrap(), "\u{FEFF}class A {}".as_bytes());
    }

    fn utf16le(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_read_utf16le() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("B.java");
        fs::write(&path, utf16le("class B {}")).unwrap();

        let source = read_source_file(&path).unwrap();
        assert_eq!(source.text, "class B {}");
        assert_eq!(source.encoding, SourceEncoding::Utf16Le);
    }

    #[test]
    fn test_utf16_is_written_back_as_utf16() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("C.java");
        fs::write(&path, utf16le("class C {}\n")).unwrap();

        let source = read_source_file(&path).unwrap();
        write_atomic(&path, "class D {}\n", source.encoding).unwrap();
        assert_eq!(fs::read(&path).unwrap(), utf16le("class D {}\n"));

        let mut big_endian = vec![0xFE, 0xFF];
        for unit in "x".encode_utf16() {
            big_endian.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(SourceEncoding::Utf16Be.encode("x"), big_endian);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.properties");
        fs::write(&path, "a=1\n").unwrap();
        write_atomic(&path, "a=2\n", SourceEncoding::Utf8).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a=2\n");
        // no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
