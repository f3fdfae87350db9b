use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Form, FromRequest, Multipart},
    http::{header, Request},
};
use std::collections::HashMap;
use tracing::debug;

/// 表单中上传的文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// 提交的原始表单数据，兼容 urlencoded 与 multipart 两种编码
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl RawForm {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, name: &str, file: UploadedFile) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// 字段值，缺失时为空字符串
    pub fn text(&self, name: &str) -> String {
        self.field(name).unwrap_or_default().to_string()
    }

    /// 去掉空白后非空的字段值
    pub fn non_empty(&self, name: &str) -> Option<String> {
        self.field(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    pub fn is_checked(&self, name: &str) -> bool {
        matches!(self.field(name), Some("on" | "true" | "1"))
    }
}

#[async_trait]
impl<S> FromRequest<S, Body> for RawForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            return Ok(Self {
                fields,
                files: HashMap::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let mut form = RawForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;

            if file_name.is_some() {
                // 浏览器在未选择文件时也会发送一个空的文件字段
                if data.is_empty() {
                    continue;
                }
                debug!("Received file field {} ({} bytes)", name, data.len());
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    },
                );
            } else {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_form_accessors() {
        let form = RawForm::from_pairs([("text", "  hello "), ("group", ""), ("image-clear", "on")]);
        assert_eq!(form.field("text"), Some("  hello "));
        assert_eq!(form.non_empty("text"), Some("hello".to_string()));
        assert_eq!(form.non_empty("group"), None);
        assert_eq!(form.text("missing"), "");
        assert!(form.is_checked("image-clear"));
        assert!(!form.is_checked("text"));
        assert!(form.file("image").is_none());
    }

    #[tokio::test]
    async fn test_urlencoded_extraction() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("text=post+for+test&group=3"))
            .unwrap();

        let form = RawForm::from_request(request, &()).await.unwrap();
        assert_eq!(form.field("text"), Some("post for test"));
        assert_eq!(form.field("group"), Some("3"));
    }

    #[tokio::test]
    async fn test_multipart_extraction() {
        let body = concat!(
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"text\"\r\n\r\n",
            "with image\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"image\"; filename=\"a.gif\"\r\n",
            "Content-Type: image/gif\r\n\r\n",
            "GIF89a\r\n",
            "--XBOUNDARY\r\n",
            "Content-Disposition: form-data; name=\"empty\"; filename=\"\"\r\n",
            "Content-Type: application/octet-stream\r\n\r\n",
            "\r\n",
            "--XBOUNDARY--\r\n",
        );
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();

        let form = RawForm::from_request(request, &()).await.unwrap();
        assert_eq!(form.field("text"), Some("with image"));
        let image = form.file("image").unwrap();
        assert_eq!(image.file_name.as_deref(), Some("a.gif"));
        assert_eq!(image.data, b"GIF89a");
        assert!(form.file("empty").is_none());
    }
}
