//! Image pipeline: compression by re-encoding
//!
//! PNG and JPEG sources are decoded and re-encoded with the image crate
//! (JPEG quality is configurable); GIFs are re-encoded frame by frame so
//! animations survive. SVG and unrecognized formats are copied verbatim;
//! their codecs are out of scope here.

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, ImageOutputFormat};
use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{discover_files, pattern_prefix, TaskContext, TaskError};

/// Error in the image pipeline
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImageError {
    /// Decode error (corrupt or unsupported content)
    #[error("Image decode error in {}: {}", .file.display(), .message)]
    Decode { file: PathBuf, message: String },
    /// Encode error
    #[error("Image encode error in {}: {}", .file.display(), .message)]
    Encode { file: PathBuf, message: String },
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the images task: compress every image under the configured glob.
///
/// Returns the list of files written to the dist tree.
pub fn run(ctx: &TaskContext) -> Result<Vec<PathBuf>, TaskError> {
    let src_dir = ctx.src_dir();
    let pattern = &ctx.config().images.sources;
    let images_root = src_dir.join(pattern_prefix(pattern));
    let out_dir = ctx.dist_dir().join(&ctx.config().images.out);
    let jpeg_quality = ctx.config().images.jpeg_quality;

    let mut outputs = Vec::new();
    for file in discover_files(&src_dir, pattern)? {
        let rel = file.strip_prefix(&images_root).unwrap_or(&file).to_path_buf();
        let dest = out_dir.join(&rel);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(ImageError::Io)?;
        }
        compress_one(&file, &dest, jpeg_quality)?;
        outputs.push(dest);
    }

    Ok(outputs)
}

/// Compress a single image into `dest`.
///
/// Formats without a re-encode path are copied unchanged. Output is
/// encoded in memory and written in one checked step, so a failing write
/// surfaces as an error instead of vanishing in a dropped writer.
pub fn compress_one(file: &Path, dest: &Path, jpeg_quality: u8) -> Result<(), ImageError> {
    let format = match extension(file).as_deref() {
        Some("png") => Some(ImageOutputFormat::Png),
        Some("jpg") | Some("jpeg") => Some(ImageOutputFormat::Jpeg(jpeg_quality)),
        Some("gif") => return compress_gif(file, dest),
        _ => None,
    };

    let Some(format) = format else {
        fs::copy(file, dest).map_err(ImageError::Io)?;
        return Ok(());
    };

    let img = image::open(file)
        .map_err(|e| ImageError::Decode { file: file.to_path_buf(), message: e.to_string() })?;

    let mut encoded = Vec::new();
    img.write_to(&mut Cursor::new(&mut encoded), format)
        .map_err(|e| ImageError::Encode { file: file.to_path_buf(), message: e.to_string() })?;
    fs::write(dest, encoded).map_err(ImageError::Io)?;

    Ok(())
}

/// Re-encode a GIF frame by frame.
///
/// `image::open` keeps only the first frame, so animated GIFs go through
/// the dedicated decoder to preserve every frame and its delay.
fn compress_gif(file: &Path, dest: &Path) -> Result<(), ImageError> {
    let input = BufReader::new(File::open(file).map_err(ImageError::Io)?);
    let decoder = GifDecoder::new(input)
        .map_err(|e| ImageError::Decode { file: file.to_path_buf(), message: e.to_string() })?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| ImageError::Decode { file: file.to_path_buf(), message: e.to_string() })?;

    let mut encoded = Vec::new();
    let mut encoder = GifEncoder::new(&mut encoded);
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| ImageError::Encode { file: file.to_path_buf(), message: e.to_string() })?;
    encoder
        .encode_frames(frames)
        .map_err(|e| ImageError::Encode { file: file.to_path_buf(), message: e.to_string() })?;
    drop(encoder);
    fs::write(dest, encoded).map_err(ImageError::Io)?;

    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use image::{Frame, ImageBuffer, Rgba};
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> TaskContext {
        TaskContext::new(SiteConfig::default(), temp.path().to_path_buf())
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 64, 255])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_png_reencode_preserves_dimensions() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/img");
        fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("logo.png"), 12, 8);

        let outputs = run(&context(&temp)).unwrap();
        assert_eq!(outputs, vec![temp.path().join("dist/img/logo.png")]);

        let rebuilt = image::open(&outputs[0]).unwrap();
        assert_eq!(rebuilt.width(), 12);
        assert_eq!(rebuilt.height(), 8);
    }

    #[test]
    fn test_svg_copied_verbatim() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/img");
        fs::create_dir_all(&dir).unwrap();
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect width=\"4\" height=\"4\"/></svg>";
        fs::write(dir.join("icon.svg"), svg).unwrap();

        run(&context(&temp)).unwrap();
        let copied = fs::read_to_string(temp.path().join("dist/img/icon.svg")).unwrap();
        assert_eq!(copied, svg);
    }

    #[test]
    fn test_animated_gif_keeps_all_frames() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/img");
        fs::create_dir_all(&dir).unwrap();

        let mut encoded = Vec::new();
        let mut encoder = GifEncoder::new(&mut encoded);
        for shade in [0u8, 128, 255] {
            let frame = Frame::new(ImageBuffer::from_pixel(4, 4, Rgba([shade, 0, 0, 255])));
            encoder.encode_frame(frame).unwrap();
        }
        drop(encoder);
        fs::write(dir.join("anim.gif"), encoded).unwrap();

        run(&context(&temp)).unwrap();

        let out = File::open(temp.path().join("dist/img/anim.gif")).unwrap();
        let frames = GifDecoder::new(BufReader::new(out))
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap();
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn test_unwritable_destination_is_an_error() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("logo.png");
        write_png(&src, 2, 2);

        // Destination directory does not exist; the write must fail loudly
        let dest = temp.path().join("missing/logo.png");
        let result = compress_one(&src, &dest, 80);
        assert!(matches!(result, Err(ImageError::Io(_))));
    }

    #[test]
    fn test_corrupt_png_is_an_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/img");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.png"), b"not a png").unwrap();

        let result = run(&context(&temp));
        assert!(matches!(result, Err(TaskError::Image(ImageError::Decode { .. }))));
    }

    #[test]
    fn test_nested_sources_mirror_layout() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/img/icons");
        fs::create_dir_all(&dir).unwrap();
        write_png(&dir.join("dot.png"), 2, 2);

        run(&context(&temp)).unwrap();
        assert!(temp.path().join("dist/img/icons/dot.png").exists());
    }
}
