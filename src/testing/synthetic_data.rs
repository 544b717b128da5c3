//! Synthetic photos for offline testing
//!
//! Everything here is encoded on the fly, so capture paths can be tested
//! end to end without a camera attached.

use crate::device::simulator::synthetic_jpeg;
use crate::device::CapturedPhoto;
use crate::types::Dimensions;
use bytes::Bytes;

/// A captured photo as a hardware device would hand it over
pub fn synthetic_photo(width: u32, height: u32, seed: u8) -> CapturedPhoto {
    let image = synthetic_jpeg(width, height, seed)
        .map(Bytes::from)
        .unwrap_or_else(|e| {
            log::warn!("Synthetic JPEG encode failed: {}", e);
            Bytes::new()
        });

    CapturedPhoto {
        image,
        thumbnail: None,
        dimensions: Dimensions { width, height },
    }
}
