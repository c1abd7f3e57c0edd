//! Image intake: decode and validate the uploaded chart before dispatch.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageFormat;

/// A validated chart upload, ready to be attached to a generation request.
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub data: Vec<u8>,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ChartImage {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }
}

/// Decode a base64 upload (optionally with a `data:` URL prefix) and verify
/// it is a real JPEG or PNG bitmap. Anything else is a user-facing error,
/// never a panic.
pub fn decode_upload(encoded: &str) -> Result<ChartImage, String> {
    let raw = encoded
        .split_once("base64,")
        .map(|(_, body)| body)
        .unwrap_or(encoded);

    let data = BASE64
        .decode(raw.trim())
        .map_err(|e| format!("图片数据解码失败: {}", e))?;

    if data.is_empty() {
        return Err("图片数据为空".to_string());
    }

    let format =
        image::guess_format(&data).map_err(|e| format!("无法识别图片格式: {}", e))?;
    let mime = match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        other => {
            return Err(format!(
                "不支持的图片格式: {:?}，请上传 JPEG 或 PNG",
                other
            ))
        }
    };

    // Full bitmap decode so a truncated or corrupt file is rejected here
    // instead of surfacing as a provider-side error.
    let bitmap = image::load_from_memory_with_format(&data, format)
        .map_err(|e| format!("图片解码失败: {}", e))?;

    Ok(ChartImage {
        width: bitmap.width(),
        height: bitmap.height(),
        mime,
        data,
    })
}
