use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Files above this size are never sniffed or inlined.
pub const MAX_TEXT_FILE_SIZE: u64 = 20 * 1024 * 1024;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "adoc",
    "rs", "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "cc", "h", "hpp",
    "cs", "csproj", "sln", "props", "targets", "razor", "cshtml", "xaml", "resx",
    "vb", "fs", "fsx", "go", "rb", "php", "swift", "kt", "kts", "scala", "dart",
    "html", "htm", "xml", "css", "scss", "sass", "less", "svg", "vue", "svelte",
    "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "config", "properties",
    "sql", "sh", "bash", "zsh", "ps1", "bat", "cmd", "cmake", "gradle",
    "gitignore", "gitattributes", "editorconfig", "env", "lock", "csv", "tsv",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "pdb", "lib", "a", "o", "obj", "class", "pyc",
    "zip", "tar", "gz", "bz2", "7z", "rar", "jar", "nupkg",
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "tiff",
    "mp3", "mp4", "avi", "mkv", "mov", "wav",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    "bin", "db", "sqlite", "cache", "suo",
];

/// Determines if a file is likely to be a text file.
///
/// Known extensions decide immediately. Otherwise the first kilobyte is
/// sniffed: no NUL bytes and valid UTF-8 means text.
pub fn is_text_file(path: &Path) -> io::Result<bool> {
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        let ext_lower = extension.to_lowercase();
        if TEXT_EXTENSIONS.contains(&ext_lower.as_str()) {
            return Ok(true);
        }
        if BINARY_EXTENSIONS.contains(&ext_lower.as_str()) {
            return Ok(false);
        }
    }

    if std::fs::metadata(path)?.len() > MAX_TEXT_FILE_SIZE {
        return Ok(false);
    }
    check_file_content(path)
}

fn check_file_content(path: &Path) -> io::Result<bool> {
    let mut buffer = [0; 1024];
    let bytes_read = File::open(path)?.read(&mut buffer)?;
    let head = &buffer[..bytes_read];

    if head.contains(&0) {
        tracing::trace!("{} looks binary (NUL byte)", path.display());
        return Ok(false);
    }
    // A multi-byte character may be cut off at the end of the buffer.
    Ok(match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_known_extensions_skip_sniffing() {
        // Neither file exists; the extension alone decides.
        assert!(is_text_file(Path::new("missing/Program.CS")).unwrap());
        assert!(!is_text_file(Path::new("missing/App.dll")).unwrap());
    }

    #[test]
    fn test_unknown_extension_is_sniffed() {
        let dir = tempdir().unwrap();
        let text = dir.path().join("notes.unknown");
        let binary = dir.path().join("blob.unknown");
        let empty = dir.path().join("Makefile");
        std::fs::write(&text, "plain words").unwrap();
        std::fs::write(&binary, [0x7f, b'E', b'L', b'F', 0, 1]).unwrap();
        std::fs::write(&empty, "").unwrap();

        assert!(is_text_file(&text).unwrap());
        assert!(!is_text_file(&binary).unwrap());
        assert!(is_text_file(&empty).unwrap());
    }

    #[test]
    fn test_truncated_utf8_at_buffer_end_is_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.unknown");
        let mut content = vec![b'a'; 1023];
        content.extend_from_slice("é".as_bytes());
        std::fs::write(&path, content).unwrap();
        assert!(is_text_file(&path).unwrap());
    }

    #[test]
    fn test_missing_unknown_file_is_an_error() {
        assert!(is_text_file(Path::new("/definitely/not/here.unknown")).is_err());
    }
}
