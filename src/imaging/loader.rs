use crate::error::Result;
use crate::remote::RemoteSource;
use image::RgbImage;

/// Fetch and decode one frame.
///
/// Whatever the encoded layout (BGR JPEG, RGBA PNG, grayscale), the result is
/// always three channels in R, G, B order.
pub fn load_image(source: &dyn RemoteSource, url: &str) -> Result<RgbImage> {
    let _span = tracing::debug_span!("load_image").entered();

    let bytes = source.open(url)?.read_all()?;
    let decoded = image::load_from_memory(&bytes)?;
    let image = decoded.to_rgb8();

    tracing::debug!("Decoded {} ({}x{})", url, image.width(), image.height());
    Ok(image)
}
