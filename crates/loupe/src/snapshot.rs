use std::path::Path;

use anyhow::{anyhow, Context, Result};
use renderer::{DisplaySurface, Snapshot};

use crate::cli::SnapshotArgs;
use crate::xdisplay::XDisplay;

/// Captures the default root window and writes it to `args.path`.
pub fn run(args: SnapshotArgs) -> Result<()> {
    let display = XDisplay::open()?;
    display.log_errors();
    let mut surface = display.root_surface(display.default_root())?;
    let (width, height) = surface.dimensions();
    let snapshot = surface
        .read_pixels()
        .with_context(|| format!("failed to capture {width}x{height} root window"))?;
    write_png(&snapshot, &args.path)?;
    tracing::info!(path = %args.path.display(), width, height, "wrote snapshot");
    Ok(())
}

pub fn write_png(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(snapshot.width(), snapshot.height(), snapshot.to_rgba())
        .ok_or_else(|| anyhow!("snapshot buffer does not match its dimensions"))?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::PixelLayout;

    #[test]
    fn writes_padded_bgrx_as_rgba_png() {
        // 2x1 image, blue then red, with a padded row.
        let pixels = vec![255, 0, 0, 0, 0, 0, 255, 0, 9, 9, 9, 9];
        let snapshot = Snapshot::new(2, 1, 12, PixelLayout::Bgrx8, pixels).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.png");

        write_png(&snapshot, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let snapshot = Snapshot::new(1, 1, 4, PixelLayout::Bgrx8, vec![0; 4]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("screen.png");
        let err = write_png(&snapshot, &path).unwrap_err();
        assert!(err.to_string().contains("failed to write"));
    }
}
