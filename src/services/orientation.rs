// src/services/orientation.rs
//! EXIF orientation correction.
//!
//! Cameras often store pixels in sensor order and record how the picture
//! should be displayed in the EXIF `Orientation` tag. Before resizing, the
//! pixels are remapped so that the tag can be ignored downstream.
//!
//! ```text
//!   1: Identity    2: FlipHorizontal  3: Rotate180   4: FlipVertical
//!   5: Transpose   6: Rotate90        7: Transverse  8: Rotate270
//! ```
//!
//! Markers 5 to 8 swap width and height.
use crate::errors::ResizerError;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Pixel};
use log::debug;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Identity,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_marker(marker: u32) -> Result<Self, ResizerError> {
        Ok(match marker {
            1 => Orientation::Identity,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            other => return Err(ResizerError::Orientation(other)),
        })
    }

    pub fn marker(&self) -> u32 {
        match self {
            Orientation::Identity => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90 => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate270 => 8,
        }
    }

    pub fn swaps_axes(&self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }

    /// Bounds of the corrected image for a source of `width` x `height`.
    pub fn output_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Source pixel sampled for destination pixel `(dx, dy)`.
    ///
    /// `width` and `height` are the source bounds.
    pub fn source_pixel(&self, dx: u32, dy: u32, width: u32, height: u32) -> (u32, u32) {
        let last_x = width - 1;
        let last_y = height - 1;
        match self {
            Orientation::Identity => (dx, dy),
            Orientation::FlipHorizontal => (last_x - dx, dy),
            Orientation::Rotate180 => (last_x - dx, last_y - dy),
            Orientation::FlipVertical => (dx, last_y - dy),
            Orientation::Transpose => (dy, dx),
            Orientation::Rotate90 => (dy, last_y - dx),
            Orientation::Transverse => (last_x - dy, last_y - dx),
            Orientation::Rotate270 => (last_x - dy, dx),
        }
    }

    /// Builds the corrected buffer, reading each source pixel exactly once.
    pub fn remap<I>(&self, src: &I) -> ImageBuffer<I::Pixel, Vec<<I::Pixel as Pixel>::Subpixel>>
    where
        I: GenericImageView,
    {
        let (width, height) = src.dimensions();
        let (out_width, out_height) = self.output_size(width, height);
        ImageBuffer::from_fn(out_width, out_height, |dx, dy| {
            let (sx, sy) = self.source_pixel(dx, dy, width, height);
            src.get_pixel(sx, sy)
        })
    }

    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Identity => img,
            _ => DynamicImage::ImageRgba8(self.remap(&img)),
        }
    }
}

/// Reads the raw EXIF orientation marker, if there is one.
pub fn read_marker(data: &[u8]) -> Option<u32> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("fail to decode EXIF data: {}", e);
            return None;
        }
    };
    let Some(field) = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) else {
        debug!("orientation tag doesn't exist");
        return None;
    };
    let marker = field.value.get_uint(0);
    if marker.is_none() {
        debug!("orientation tag isn't an integer");
    }
    marker
}

/// Returns `img` with its EXIF orientation baked into the pixels.
///
/// Missing or unreadable metadata leaves the image untouched; only a marker
/// outside 1..=8 is an error.
pub fn correct(img: DynamicImage, data: &[u8]) -> Result<DynamicImage, ResizerError> {
    if !matches!(image::guess_format(data), Ok(ImageFormat::Jpeg)) {
        return Ok(img);
    }
    let Some(marker) = read_marker(data) else {
        return Ok(img);
    };
    let orientation = Orientation::from_marker(marker)?;
    debug!("applying orientation {:?} (marker {})", orientation, orientation.marker());
    Ok(orientation.apply(img))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbImage};

    const ALL: [Orientation; 8] = [
        Orientation::Identity,
        Orientation::FlipHorizontal,
        Orientation::Rotate180,
        Orientation::FlipVertical,
        Orientation::Transpose,
        Orientation::Rotate90,
        Orientation::Transverse,
        Orientation::Rotate270,
    ];

    // a b c
    // d e f
    fn sample() -> GrayImage {
        GrayImage::from_raw(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap()
    }

    fn rows(img: &GrayImage) -> Vec<Vec<u8>> {
        (0..img.height())
            .map(|y| (0..img.width()).map(|x| img.get_pixel(x, y)[0]).collect())
            .collect()
    }

    #[test]
    fn marker_table() {
        let expected: [(u32, Vec<Vec<u8>>); 8] = [
            (1, vec![vec![1, 2, 3], vec![4, 5, 6]]),
            (2, vec![vec![3, 2, 1], vec![6, 5, 4]]),
            (3, vec![vec![6, 5, 4], vec![3, 2, 1]]),
            (4, vec![vec![4, 5, 6], vec![1, 2, 3]]),
            (5, vec![vec![1, 4], vec![2, 5], vec![3, 6]]),
            (6, vec![vec![4, 1], vec![5, 2], vec![6, 3]]),
            (7, vec![vec![6, 3], vec![5, 2], vec![4, 1]]),
            (8, vec![vec![3, 6], vec![2, 5], vec![1, 4]]),
        ];
        for (marker, want) in expected {
            let orientation = Orientation::from_marker(marker).unwrap();
            assert_eq!(orientation.marker(), marker);
            assert_eq!(rows(&orientation.remap(&sample())), want, "marker {}", marker);
        }
    }

    #[test]
    fn all_arrangements_are_distinct() {
        let outputs: Vec<_> = ALL.iter().map(|o| rows(&o.remap(&sample()))).collect();
        for i in 0..outputs.len() {
            for j in i + 1..outputs.len() {
                assert_ne!(outputs[i], outputs[j], "{:?} vs {:?}", ALL[i], ALL[j]);
            }
        }
    }

    #[test]
    fn exactly_four_markers_swap_axes() {
        let swapping: Vec<u32> = ALL.iter().filter(|o| o.swaps_axes()).map(|o| o.marker()).collect();
        assert_eq!(swapping, vec![5, 6, 7, 8]);
        assert_eq!(Orientation::Rotate90.output_size(4, 3), (3, 4));
        assert_eq!(Orientation::Rotate180.output_size(4, 3), (4, 3));
    }

    #[test]
    fn involutions_and_inverse_pairs() {
        let original = rows(&sample());
        for marker in [1, 2, 3, 4, 5, 7] {
            let o = Orientation::from_marker(marker).unwrap();
            assert_eq!(rows(&o.remap(&o.remap(&sample()))), original, "marker {}", marker);
        }
        let (rot90, rot270) = (Orientation::Rotate90, Orientation::Rotate270);
        assert_eq!(rows(&rot270.remap(&rot90.remap(&sample()))), original);
        assert_eq!(rows(&rot90.remap(&rot270.remap(&sample()))), original);
        assert_ne!(rows(&rot90.remap(&rot90.remap(&sample()))), original);
    }

    #[test]
    fn rejects_out_of_range_markers() {
        for marker in [0, 9, 255] {
            assert!(matches!(
                Orientation::from_marker(marker),
                Err(ResizerError::Orientation(m)) if m == marker
            ));
        }
    }

    /// JPEG bytes of `img` carrying a big-endian EXIF orientation tag.
    pub(crate) fn jpeg_with_orientation(img: &RgbImage, marker: u16) -> Vec<u8> {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageOutputFormat::Jpeg(90))
            .unwrap();

        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&marker.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\x00\x00".to_vec();
        payload.extend_from_slice(&tiff);
        let length = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn corrects_rotated_jpeg() {
        let src = RgbImage::from_pixel(8, 4, image::Rgb([200, 10, 10]));
        let data = jpeg_with_orientation(&src, 6);
        assert_eq!(read_marker(&data), Some(6));
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.dimensions(), (8, 4));
        let corrected = correct(decoded, &data).unwrap();
        assert_eq!(corrected.dimensions(), (4, 8));
    }

    #[test]
    fn invalid_marker_is_fatal() {
        let src = RgbImage::from_pixel(8, 4, image::Rgb([0, 0, 0]));
        let data = jpeg_with_orientation(&src, 9);
        let decoded = image::load_from_memory(&data).unwrap();
        assert!(matches!(correct(decoded, &data), Err(ResizerError::Orientation(9))));
    }

    #[test]
    fn missing_metadata_is_ignored() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 3, Luma([7])));
        let mut png = Vec::new();
        gray.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
            .unwrap();
        let corrected = correct(gray.clone(), &png).unwrap();
        assert_eq!(corrected, gray);

        let mut jpeg = Vec::new();
        gray.write_to(&mut Cursor::new(&mut jpeg), image::ImageOutputFormat::Jpeg(80))
            .unwrap();
        assert_eq!(read_marker(&jpeg), None);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(correct(decoded, &jpeg).unwrap().dimensions(), (5, 3));
    }
}
