use std::path::Path;

use anyhow::{Context, Result};
use client_core::ingest::ImageFile;

const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

pub async fn read_image_file(path: &Path) -> Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(ImageFile {
        name: file_name(path),
        declared_type: declared_type(path),
        bytes,
    })
}

/// Media type as a browser would declare it: guessed from the extension.
fn declared_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
        .to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("photo")
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn declares_media_type_from_extension() {
        assert_eq!(declared_type(Path::new("me.JPG")), "image/jpeg");
        assert_eq!(declared_type(Path::new("me.png")), "image/png");
        assert_eq!(declared_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(declared_type(Path::new("no_extension")), UNKNOWN_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn reads_bytes_and_name() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("gifswap_input_{suffix}.png"));
        fs::write(&path, b"png-bytes").expect("write");

        let file = read_image_file(&path).await.expect("read");
        assert_eq!(file.bytes, b"png-bytes");
        assert_eq!(file.declared_type, "image/png");
        assert!(file.name.starts_with("gifswap_input_"));

        fs::remove_file(path).expect("cleanup");
    }
}
