use serde::{Deserialize, Serialize};

/// 图片格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    /// 获取文件扩展名
    pub fn to_extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// 该格式是否在允许的扩展名列表中（`jpg` 与 `jpeg` 视为同一种）
    pub fn is_allowed(&self, allowed_extensions: &[String]) -> bool {
        allowed_extensions.iter().any(|ext| match self {
            Self::Jpeg => ext == "jpg" || ext == "jpeg",
            other => ext == other.to_extension(),
        })
    }
}

/// 图片尺寸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// 图片处理工具
pub struct ImageProcessor;

impl ImageProcessor {
    /// 检测图片格式，只看文件头
    pub fn detect_format(data: &[u8]) -> Result<ImageFormat, String> {
        if data.len() < 4 {
            return Err("Data too short to detect an image format".to_string());
        }

        match &data[0..4] {
            [0xFF, 0xD8, 0xFF, _] => Ok(ImageFormat::Jpeg),
            [0x89, 0x50, 0x4E, 0x47] => Ok(ImageFormat::Png),
            [0x47, 0x49, 0x46, _] => Ok(ImageFormat::Gif),
            _ => {
                if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
                    Ok(ImageFormat::Webp)
                } else {
                    Err("Unsupported image format".to_string())
                }
            }
        }
    }

    /// 从文件头读取图片尺寸
    pub fn dimensions(data: &[u8]) -> Result<ImageDimensions, String> {
        match Self::detect_format(data)? {
            ImageFormat::Png => Self::png_dimensions(data),
            ImageFormat::Jpeg => Self::jpeg_dimensions(data),
            ImageFormat::Gif => Self::gif_dimensions(data),
            ImageFormat::Webp => Self::webp_dimensions(data),
        }
    }

    fn png_dimensions(data: &[u8]) -> Result<ImageDimensions, String> {
        if data.len() < 24 {
            return Err("Truncated PNG header".to_string());
        }

        // IHDR 块位于第 16-24 字节
        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);

        Ok(ImageDimensions { width, height })
    }

    fn jpeg_dimensions(data: &[u8]) -> Result<ImageDimensions, String> {
        let mut i = 0;
        while i + 1 < data.len() {
            if data[i] == 0xFF {
                let marker = data[i + 1];
                // SOF0-SOF3
                if (0xC0..=0xC3).contains(&marker) && i + 9 < data.len() {
                    let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                    let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                    return Ok(ImageDimensions { width, height });
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        Err("No JPEG frame header found".to_string())
    }

    fn gif_dimensions(data: &[u8]) -> Result<ImageDimensions, String> {
        if data.len() < 10 {
            return Err("Truncated GIF header".to_string());
        }

        let width = u16::from_le_bytes([data[6], data[7]]) as u32;
        let height = u16::from_le_bytes([data[8], data[9]]) as u32;

        Ok(ImageDimensions { width, height })
    }

    fn webp_dimensions(data: &[u8]) -> Result<ImageDimensions, String> {
        if data.len() < 30 {
            return Err("Truncated WebP header".to_string());
        }

        let dims = match &data[12..16] {
            // 有损：帧头中的 14 位宽高
            b"VP8 " => ImageDimensions {
                width: (u16::from_le_bytes([data[26], data[27]]) & 0x3FFF) as u32,
                height: (u16::from_le_bytes([data[28], data[29]]) & 0x3FFF) as u32,
            },
            // 无损：签名 0x2F 之后的 14 位宽高减一
            b"VP8L" => {
                if data[20] != 0x2F {
                    return Err("Invalid lossless WebP signature".to_string());
                }
                let bits = u32::from_le_bytes([data[21], data[22], data[23], data[24]]);
                ImageDimensions {
                    width: (bits & 0x3FFF) + 1,
                    height: ((bits >> 14) & 0x3FFF) + 1,
                }
            },
            // 扩展格式：24 位画布宽高减一
            b"VP8X" => ImageDimensions {
                width: u32::from_le_bytes([data[24], data[25], data[26], 0]) + 1,
                height: u32::from_le_bytes([data[27], data[28], data[29], 0]) + 1,
            },
            _ => return Err("Unknown WebP chunk".to_string()),
        };

        Ok(dims)
    }

    /// 校验上传的图片：格式可识别且在允许列表中，文件头带有效尺寸，未超出大小限制
    pub fn validate_image(
        data: &[u8],
        allowed_extensions: &[String],
        max_size: Option<usize>,
    ) -> Result<ImageFormat, String> {
        if data.is_empty() {
            return Err("The submitted file is empty".to_string());
        }

        if let Some(max) = max_size {
            if data.len() > max {
                return Err(format!("Image exceeds the {} byte limit", max));
            }
        }

        let format = Self::detect_format(data)?;
        if !format.is_allowed(allowed_extensions) {
            return Err(format!("Images of type {} are not allowed", format.to_extension()));
        }

        let dims = Self::dimensions(data)?;
        if dims.width == 0 || dims.height == 0 {
            return Err(format!("Image has no pixels ({}x{})", dims.width, dims.height));
        }

        Ok(format)
    }

    /// 生成唯一文件名
    pub fn generate_filename(format: &ImageFormat) -> String {
        format!("{}.{}", uuid::Uuid::new_v4().simple(), format.to_extension())
    }
}
