use std::path::Path;

use anyhow::{bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Reads an image file into a `data:` URL the server stores as-is.
pub async fn image_data_url(path: &Path) -> anyhow::Result<String> {
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"));
    let Some(mime_type) = mime_type else {
        bail!("{} is not an image", path.display());
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encodes_png_as_data_url() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("dot.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).expect("write image");

        let url = image_data_url(&path).await.expect("data url");
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn rejects_non_images() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").expect("write file");

        let err = image_data_url(&path).await.expect_err("not an image");
        assert!(err.to_string().contains("is not an image"));
    }
}
