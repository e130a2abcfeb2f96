use bead_machine::{
    boards::boards_needed,
    filters::{
        apply_filters,
        resize,
        FilterOptions,
    },
    html::save_html,
    load_palette,
    processor::save_png,
    Error,
    InclusionFlags,
    PaletteIndex,
    PixelProcessor,
    ProcessOptions,
};
use image::{
    DynamicImage,
    GenericImageView,
    Rgba,
    RgbaImage,
};

const PALETTE: &str = r#"{
    "black": {"R": 0, "G": 0, "B": 0, "GreyShade": true},
    "white": {"R": 255, "G": 255, "B": 255, "GreyShade": true},
    "red": {"R": 200, "G": 20, "B": 30},
    "blue": {"R": 20, "G": 40, "B": 190},
    "clear red": {"R": 220, "G": 30, "B": 40, "Translucent": true},
    "neon green": {"R": 60, "G": 255, "B": 40, "Flourescent": true}
}"#;

fn palette_file() -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), PALETTE).unwrap();
    file
}

fn checkerboard() -> RgbaImage {
    RgbaImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
        (true, true) => Rgba([210, 25, 25, 255]),
        (false, true) => Rgba([25, 35, 200, 255]),
        (true, false) => Rgba([10, 10, 10, 255]),
        (false, false) => Rgba([245, 245, 245, 255]),
    })
}

#[test]
fn pattern_from_palette_file() {
    let file = palette_file();
    let entries = load_palette(file.path()).unwrap();
    let index = PaletteIndex::filter(entries, InclusionFlags::default()).unwrap();
    assert_eq!(index.len(), 4);

    let pattern = PixelProcessor::new(&index, ProcessOptions::default())
        .run(&checkerboard())
        .unwrap();

    assert_eq!(pattern.usage.distinct(), 4);
    for bead in ["red", "blue", "black", "white"] {
        assert_eq!(pattern.usage.count(bead), 4, "{bead}");
    }
    assert_eq!(pattern.usage.count("clear red"), 0);
}

#[test]
fn translucent_beads_take_part_when_enabled() {
    let file = palette_file();
    let entries = load_palette(file.path()).unwrap();
    let flags = InclusionFlags {
        translucent: true,
        ..Default::default()
    };
    let index = PaletteIndex::filter(entries, flags).unwrap();

    let input = RgbaImage::from_pixel(2, 2, Rgba([220, 30, 40, 255]));
    let pattern = PixelProcessor::new(&index, ProcessOptions::default())
        .run(&input)
        .unwrap();

    assert_eq!(pattern.usage.count("clear red"), 4);
}

#[test]
fn grey_scale_uses_only_grey_beads() {
    let file = palette_file();
    let entries = load_palette(file.path()).unwrap();
    let flags = InclusionFlags {
        grey_scale: true,
        translucent: true,
        fluorescent: true,
        ..Default::default()
    };
    let index = PaletteIndex::filter(entries, flags).unwrap();

    let pattern = PixelProcessor::new(&index, ProcessOptions::default())
        .run(&checkerboard())
        .unwrap();

    assert_eq!(pattern.usage.total(), 16);
    assert_eq!(pattern.usage.count("black") + pattern.usage.count("white"), 16);
}

#[test]
fn empty_palette_is_fatal() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{"clear": {"R": 230, "G": 230, "B": 230, "Translucent": true}}"#,
    )
    .unwrap();

    let entries = load_palette(file.path()).unwrap();
    let result = PaletteIndex::filter(entries, InclusionFlags::default());
    assert!(matches!(result, Err(Error::EmptyPalette)));
}

#[test]
fn bead_style_pipeline_with_html() {
    let file = palette_file();
    let index =
        PaletteIndex::filter(load_palette(file.path()).unwrap(), InclusionFlags::default()).unwrap();

    let image = DynamicImage::ImageRgba8(checkerboard());
    let image = apply_filters(image, &FilterOptions::default());
    let image = resize(&image, 0, 4);
    assert_eq!(image.dimensions(), (4, 4));

    let options = ProcessOptions {
        bead_style: true,
        ..Default::default()
    };
    let pattern = PixelProcessor::new(&index, options)
        .run(&image.to_rgba8())
        .unwrap();

    assert_eq!(pattern.image.dimensions(), (32, 32));
    assert_eq!(pattern.usage.total(), 16);
    assert_eq!(boards_needed(pattern.image.width() / 8), 0);

    let grid = pattern.matches.as_ref().unwrap();
    assert_eq!(&*grid.get(0, 0).unwrap().name, "red");
    assert_eq!(&*grid.get(3, 3).unwrap().name, "white");

    let dir = tempfile::tempdir().unwrap();
    let html_path = dir.path().join("pattern.html");
    save_html(&html_path, grid, &pattern.usage).unwrap();
    let html = std::fs::read_to_string(html_path).unwrap();
    assert_eq!(html.matches("<td style=").count(), 16);

    let png_path = dir.path().join("pattern.png");
    save_png(&pattern.image, &png_path).unwrap();
    let reloaded = image::open(&png_path).unwrap().to_rgba8();
    assert_eq!(reloaded, pattern.image);
}
