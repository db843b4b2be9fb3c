use std::io::{Cursor, Write};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use super::models::GeneratedImage;

/// 将生成结果按顺序写入内存中的 deflate zip。
///
/// CPU 密集，异步上下文中应放到 `spawn_blocking` 执行。
pub fn build_zip(images: &[GeneratedImage]) -> zip::result::ZipResult<Vec<u8>> {
    let capacity = images.iter().map(|img| img.data.len()).sum::<usize>();
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(capacity)));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for image in images {
        writer.start_file(image.filename.as_str(), options)?;
        writer.write_all(&image.data)?;
    }

    Ok(writer.finish()?.into_inner())
}
