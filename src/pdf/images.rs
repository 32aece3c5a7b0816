use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::{debug, info, instrument};

/// How images are laid out when combined into a PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePdfOptions {
    /// Resolution used to size each page from the image's pixel dimensions.
    pub dpi: f32,
}

impl Default for ImagePdfOptions {
    fn default() -> Self {
        // One pixel per point
        ImagePdfOptions { dpi: 72.0 }
    }
}

/// Combine images into a PDF with one page per image, each page exactly the
/// size of its image. Transparency is discarded; pixels are stored as RGB.
#[instrument(skip_all, fields(images = images.len(), dpi = options.dpi))]
pub fn images_to_pdf<B: AsRef<[u8]>>(images: &[B], options: &ImagePdfOptions) -> Result<Document> {
    if images.is_empty() {
        anyhow::bail!("No images provided");
    }
    if !(options.dpi.is_finite() && options.dpi > 0.0) {
        anyhow::bail!("Invalid resolution: {} dpi", options.dpi);
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(images.len());

    for (index, bytes) in images.iter().enumerate() {
        let rgb = image::load_from_memory(bytes.as_ref())
            .with_context(|| format!("Failed to decode image #{}", index + 1))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        debug!(image = index + 1, width, height, "embedding image");

        let mut image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width as i64),
                "Height" => Object::Integer(height as i64),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb.into_raw(),
        );
        // Left uncompressed if Flate fails
        let _ = image_stream.compress();
        let image_id = doc.add_object(image_stream);

        let page_width = width as f32 * 72.0 / options.dpi;
        let page_height = height as f32 * 72.0 / options.dpi;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_width.into(),
                        0.into(),
                        0.into(),
                        page_height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().context("Failed to encode page content")?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    info!(pages = count, "images combined into PDF");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn media_box(doc: &Document, page: u32) -> Vec<f32> {
        let page_id = doc.get_pages()[&page];
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect()
    }

    #[test]
    fn test_one_page_per_image() {
        let red = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([255, 0, 0]))),
            ImageFormat::Png,
        );
        let blue = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 16, Rgb([0, 0, 255]))),
            ImageFormat::Jpeg,
        );

        let doc = images_to_pdf(&[red, blue], &ImagePdfOptions::default()).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        assert_eq!(media_box(&doc, 1), vec![0.0, 0.0, 20.0, 10.0]);
        assert_eq!(media_box(&doc, 2), vec![0.0, 0.0, 8.0, 16.0]);
    }

    #[test]
    fn test_dpi_scales_pages() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 150, Rgb([0, 0, 0]))),
            ImageFormat::Png,
        );
        let doc = images_to_pdf(&[png], &ImagePdfOptions { dpi: 300.0 }).unwrap();
        assert_eq!(media_box(&doc, 1), vec![0.0, 0.0, 72.0, 36.0]);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 128]))),
            ImageFormat::Png,
        );
        let mut doc = images_to_pdf(&[png], &ImagePdfOptions::default()).unwrap();
        doc.decompress();

        let image = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .find(|stream| {
                stream.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..])
            })
            .unwrap();
        assert_eq!(image.content.len(), 4 * 4 * 3);
        assert_eq!(&image.content[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([9, 9, 9]))),
            ImageFormat::Png,
        );
        let mut doc = images_to_pdf(&[png], &ImagePdfOptions::default()).unwrap();
        let bytes = crate::pdf::PdfDocument::to_bytes(&mut doc).unwrap();
        let reloaded = crate::pdf::PdfDocument::from_bytes(&bytes, "images.pdf").unwrap();
        assert_eq!(reloaded.page_count(), 1);
    }

    #[test]
    fn test_no_images() {
        let empty: Vec<Vec<u8>> = Vec::new();
        assert!(images_to_pdf(&empty, &ImagePdfOptions::default()).is_err());
    }

    #[test]
    fn test_undecodable_image() {
        let err = images_to_pdf(&[b"not an image".to_vec()], &ImagePdfOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to decode image #1");
    }

    #[test]
    fn test_invalid_dpi() {
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]))),
            ImageFormat::Png,
        );
        assert!(images_to_pdf(&[png], &ImagePdfOptions { dpi: 0.0 }).is_err());
    }
}
