use imgfleet_imaging::{
    blur_bytes, blur_file, luma, Bitmap, ImageGeometry, ImagingError, KernelSize, LightFilter,
    HEADER_LEN,
};
use proptest::prelude::*;

fn arb_bitmap() -> impl Strategy<Value = Bitmap> {
    (1u32..9, 1u32..9).prop_flat_map(|(width, height)| {
        let size = ImageGeometry::new(width as usize, height as usize).image_byte_size();
        proptest::collection::vec(any::<u8>(), size)
            .prop_map(move |pixels| Bitmap::from_pixels(width, height, pixels).unwrap())
    })
}

fn arb_kernel() -> impl Strategy<Value = KernelSize> {
    (27u32..=77).prop_map(|radius| KernelSize::new(radius * 2 + 1).unwrap())
}

proptest! {
    #[test]
    fn mirror_horizontal_is_involution(bitmap in arb_bitmap()) {
        let bytes = bitmap.to_bytes();
        let once = LightFilter::MirrorHorizontal.apply_bytes(&bytes).unwrap();
        let twice = LightFilter::MirrorHorizontal.apply_bytes(&once).unwrap();
        prop_assert_eq!(twice, bytes);
    }

    #[test]
    fn mirror_vertical_is_involution(bitmap in arb_bitmap()) {
        let bytes = bitmap.to_bytes();
        let once = LightFilter::MirrorVertical.apply_bytes(&bytes).unwrap();
        let twice = LightFilter::MirrorVertical.apply_bytes(&once).unwrap();
        prop_assert_eq!(twice, bytes);
    }

    #[test]
    fn fused_grayscale_mirrors_match_two_passes(bitmap in arb_bitmap()) {
        let bytes = bitmap.to_bytes();
        let gray = LightFilter::Grayscale.apply_bytes(&bytes).unwrap();

        let fused_h = LightFilter::GrayscaleMirrorHorizontal.apply_bytes(&bytes).unwrap();
        let two_pass_h = LightFilter::MirrorHorizontal.apply_bytes(&gray).unwrap();
        prop_assert_eq!(fused_h, two_pass_h);

        let fused_v = LightFilter::GrayscaleMirrorVertical.apply_bytes(&bytes).unwrap();
        let two_pass_v = LightFilter::MirrorVertical.apply_bytes(&gray).unwrap();
        prop_assert_eq!(fused_v, two_pass_v);
    }

    #[test]
    fn blur_preserves_header_dimensions_and_padding(bitmap in arb_bitmap(), kernel in arb_kernel()) {
        let bytes = bitmap.to_bytes();
        let blurred = blur_bytes(&bytes, kernel).unwrap();
        prop_assert_eq!(blurred.len(), bytes.len());
        prop_assert_eq!(&blurred[..HEADER_LEN], &bytes[..HEADER_LEN]);

        let out = Bitmap::decode(&mut blurred.as_slice()).unwrap();
        prop_assert_eq!(out.geometry, bitmap.geometry);
        let g = out.geometry;
        for y in 0..g.height {
            let start = y * g.row_stride + g.pixel_row_bytes();
            let end = (y + 1) * g.row_stride;
            prop_assert_eq!(&out.pixels[start..end], &bitmap.pixels[start..end]);
        }
    }

    #[test]
    fn blur_of_uniform_image_is_unchanged(
        width in 1u32..9,
        height in 1u32..9,
        color in any::<[u8; 3]>(),
        kernel in arb_kernel(),
    ) {
        let g = ImageGeometry::new(width as usize, height as usize);
        let mut pixels = vec![0u8; g.image_byte_size()];
        for row in pixels.chunks_exact_mut(g.row_stride) {
            for px in row[..g.pixel_row_bytes()].chunks_exact_mut(3) {
                px.copy_from_slice(&color);
            }
        }
        let bitmap = Bitmap::from_pixels(width, height, pixels).unwrap();
        let blurred = blur_bytes(&bitmap.to_bytes(), kernel).unwrap();
        prop_assert_eq!(blurred, bitmap.to_bytes());
    }
}

#[test]
fn grayscale_small_image_with_two_padding_bytes_per_row() {
    // 宽2像素 -> 每行6字节像素 + 2字节填充
    let pixels = vec![
        10, 20, 30, 40, 50, 60, 0xDE, 0xAD, //
        255, 0, 0, 0, 255, 0, 0xBE, 0xEF, //
        0, 0, 255, 1, 2, 3, 0x01, 0x02, //
        200, 150, 100, 7, 7, 7, 0x03, 0x04,
    ];
    let bitmap = Bitmap::from_pixels(2, 4, pixels).unwrap();
    assert_eq!(bitmap.geometry.padding_bytes, 2);

    let out_bytes = LightFilter::Grayscale.apply_bytes(&bitmap.to_bytes()).unwrap();
    let out = Bitmap::decode(&mut out_bytes.as_slice()).unwrap();

    assert_eq!(out.header, bitmap.header);
    for y in 0..4 {
        for x in 0..2 {
            let [b, g, r] = bitmap.pixel(x, y);
            let expected = (0.21 * r as f64 + 0.72 * g as f64 + 0.07 * b as f64).round() as u8;
            assert_eq!(out.pixel(x, y), [expected; 3]);
            assert_eq!(expected, luma(b, g, r));
        }
        let pad = y * 8 + 6;
        assert_eq!(&out.pixels[pad..pad + 2], &bitmap.pixels[pad..pad + 2]);
    }
}

#[test]
fn grayscale_four_by_two_image() {
    let pixels: Vec<u8> = (0..24u8).map(|v| v.wrapping_mul(11)).collect();
    let bitmap = Bitmap::from_pixels(4, 2, pixels).unwrap();
    let out_bytes = LightFilter::Grayscale.apply_bytes(&bitmap.to_bytes()).unwrap();
    let out = Bitmap::decode(&mut out_bytes.as_slice()).unwrap();
    for y in 0..2 {
        for x in 0..4 {
            let [b, g, r] = bitmap.pixel(x, y);
            assert_eq!(out.pixel(x, y), [luma(b, g, r); 3]);
        }
    }
}

#[test]
fn even_kernel_rejected_before_output_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("src.bmp");
    let output = dir.path().join("src_blur.bmp");
    Bitmap::from_pixels(2, 2, vec![9u8; 16]).unwrap().save(&input).unwrap();

    let run = |size: u32| KernelSize::new(size).and_then(|k| blur_file(&input, &output, k));

    assert!(matches!(run(56), Err(ImagingError::InvalidKernel(56))));
    assert!(!output.exists());

    run(55).unwrap();
    assert!(output.exists());
}

#[test]
fn oversized_header_dimensions_fail_without_allocating() {
    let mut header = *Bitmap::from_pixels(2, 2, vec![0u8; 16]).unwrap().header.as_bytes();
    header[18..22].copy_from_slice(&(1i32 << 30).to_le_bytes());
    header[22..26].copy_from_slice(&(1i32 << 30).to_le_bytes());
    let mut input = header.to_vec();
    input.extend_from_slice(&[0x5Au8; 16]);

    let rejected = |err: ImagingError| {
        matches!(
            err,
            ImagingError::TruncatedPixelData { .. } | ImagingError::MalformedHeader { .. }
        )
    };
    for filter in LightFilter::ALL {
        let err = filter.apply_bytes(&input).unwrap_err();
        assert!(rejected(err), "{filter} accepted an oversized header");
    }
    let err = blur_bytes(&input, KernelSize::new(55).unwrap()).unwrap_err();
    assert!(rejected(err));
}

#[test]
fn light_filters_write_files_with_source_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("src.bmp");
    let pixels: Vec<u8> = (0..(8 * 3) as u8).collect();
    let bitmap = Bitmap::from_pixels(2, 3, pixels).unwrap();
    bitmap.save(&input).unwrap();

    for filter in LightFilter::ALL {
        let output = dir.path().join(format!("src_{}.bmp", filter.suffix()));
        let geometry = filter.apply_file(&input, &output).unwrap();
        assert_eq!(geometry, bitmap.geometry);

        let out = Bitmap::open(&output).unwrap();
        assert_eq!(out.header, bitmap.header);
        assert_eq!(out.pixels.len(), bitmap.pixels.len());
    }
}

#[test]
fn mirror_vertical_reverses_rows() {
    let pixels = vec![
        1, 1, 1, 0xA0, //
        2, 2, 2, 0xA1, //
        3, 3, 3, 0xA2,
    ];
    let bitmap = Bitmap::from_pixels(1, 3, pixels).unwrap();
    let out_bytes = LightFilter::MirrorVertical.apply_bytes(&bitmap.to_bytes()).unwrap();
    assert_eq!(
        &out_bytes[HEADER_LEN..],
        &[3, 3, 3, 0xA2, 2, 2, 2, 0xA1, 1, 1, 1, 0xA0]
    );
}

#[test]
fn blur_file_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let kernel = KernelSize::new(55).unwrap();
    let err = blur_file(
        &dir.path().join("missing.bmp"),
        &dir.path().join("out.bmp"),
        kernel,
    )
    .unwrap_err();
    assert!(matches!(err, ImagingError::Io { .. }));
}

#[test]
fn truncated_header_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.bmp");
    std::fs::write(&input, b"BM\x00\x00").unwrap();
    let err = LightFilter::Grayscale
        .apply_file(&input, &dir.path().join("out.bmp"))
        .unwrap_err();
    assert!(matches!(err, ImagingError::MalformedHeader { .. }));
}
