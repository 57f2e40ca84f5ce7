use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::data_structures::texture::{self, CubeTexture, Texture};

pub const ASSET_DIR: &str = "assets";

/// Absolute paths and paths that exist relative to the working directory
/// are used as given, everything else is looked up under `./assets/`.
pub fn resolve_asset_path(file_name: impl AsRef<Path>) -> PathBuf {
    let path = file_name.as_ref();
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        Path::new("./").join(ASSET_DIR).join(path)
    }
}

pub async fn load_string(file_name: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = resolve_asset_path(file_name);
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

pub async fn load_binary(file_name: impl AsRef<Path>) -> anyhow::Result<Vec<u8>> {
    let path = resolve_asset_path(file_name);
    tokio::fs::read(&path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

pub async fn load_image(file_name: &str) -> anyhow::Result<image::DynamicImage> {
    let data = load_binary(file_name).await?;
    let format = Path::new(file_name).extension().and_then(|e| e.to_str());
    texture::decode(&data, format).with_context(|| format!("cannot decode {file_name}"))
}

/// Loads an image file into a shareable texture.
pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Arc<Texture>> {
    let img = load_image(file_name).await?;
    log::info!("texture {file_name} loaded ({}x{})", img.width(), img.height());
    Ok(Arc::new(Texture::from_image(
        device,
        queue,
        &img,
        Some(file_name),
    )?))
}

/// Loads six faces in the order right, left, top, bottom, front, back.
pub async fn load_cube_map(
    faces: [&str; CubeTexture::FACES],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<CubeTexture> {
    let images = futures::future::try_join_all(faces.iter().map(|face| load_image(face))).await?;
    CubeTexture::from_images(device, queue, &images, faces[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_names_resolve_under_assets() {
        assert_eq!(
            resolve_asset_path("does/not/exist.png"),
            Path::new("./assets/does/not/exist.png")
        );
    }

    #[test]
    fn existing_paths_are_kept() {
        assert_eq!(resolve_asset_path("Cargo.toml"), Path::new("Cargo.toml"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = load_binary("missing-file.bin").await.unwrap_err();
        assert!(err.to_string().contains("missing-file.bin"));
    }
}
