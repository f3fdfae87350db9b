use crate::{
    config::Config,
    error::{AppError, Result},
    utils::{forms::UploadedFile, image::ImageProcessor},
};
use std::path::PathBuf;
use tracing::info;

/// 帖子图片的存放子目录
pub const POST_IMAGE_DIR: &str = "posts";

/// 上传文件的本地存储
#[derive(Clone)]
pub struct MediaService {
    config: Config,
}

impl MediaService {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.config.media_root)
    }

    /// 保存帖子图片，返回相对于媒体目录的路径
    pub async fn save_post_image(&self, file: &UploadedFile) -> Result<String> {
        let format = ImageProcessor::validate_image(
            &file.data,
            &self.config.allowed_image_extensions(),
            Some(self.config.max_upload_size),
        )
        .map_err(AppError::BadRequest)?;

        let dir = self.root().join(POST_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let filename = ImageProcessor::generate_filename(&format);
        tokio::fs::write(dir.join(&filename), &file.data).await?;

        let relative = format!("{}/{}", POST_IMAGE_DIR, filename);
        info!("Stored {} byte image at {}", file.data.len(), relative);
        Ok(relative)
    }

    /// 媒体文件的公开地址
    pub fn url(&self, relative_path: &str) -> String {
        format!(
            "{}/{}",
            self.config.media_url.trim_end_matches('/'),
            relative_path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::image::tests::TINY_GIF;

    #[tokio::test]
    async fn test_save_post_image() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaService::new(&Config {
            media_root: dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        });

        let file = UploadedFile {
            file_name: Some("small.gif".to_string()),
            content_type: Some("image/gif".to_string()),
            data: TINY_GIF.to_vec(),
        };
        let path = media.save_post_image(&file).await.unwrap();
        assert!(path.starts_with("posts/"));
        assert!(path.ends_with(".gif"));

        let stored = tokio::fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(stored, TINY_GIF);
        assert_eq!(media.url(&path), format!("/media/{}", path));
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaService::new(&Config {
            media_root: dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        });
        let file = UploadedFile {
            file_name: Some("notes.txt".to_string()),
            content_type: None,
            data: b"not an image".to_vec(),
        };
        assert!(media.save_post_image(&file).await.is_err());
    }
}
