use std::path::PathBuf;

use anyhow::{
    bail,
    Context,
};
use bead_machine::{
    boards::{
        log_board_usage,
        ResizeOptions,
        DEFAULT_BOARD_DIMENSION,
    },
    filters::{
        apply_filters,
        resize,
        FilterOptions,
    },
    html::save_html,
    load_palette,
    processor::{
        copy_opaque,
        save_png,
    },
    InclusionFlags,
    PaletteIndex,
    PixelProcessor,
    ProcessOptions,
};
use clap::Parser;
use image::GenericImageView;
use tracing::info;
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Bead pattern creator.
#[derive(Debug, Parser)]
#[clap(name = "beadmachine", version)]
struct Args {
    /// Image to process.
    #[clap(long, short)]
    input: Option<PathBuf>,

    /// Image to process, if `--input` is not given.
    file: Option<PathBuf>,

    /// Output filename for the converted PNG image.
    #[clap(long, short)]
    output: PathBuf,

    /// Output filename for a HTML based bead pattern file.
    #[clap(long = "html", short = 'l')]
    html: Option<PathBuf>,

    /// Filename of the bead palette.
    #[clap(long, short, default_value = "colors_hama.json")]
    palette: PathBuf,

    /// Resize image to width in pixel.
    #[clap(long, short, default_value_t = 0)]
    width: u32,

    /// Resize image to height in pixel.
    #[clap(long, short = 'e', default_value_t = 0)]
    height: u32,

    /// Resize image to width in amount of boards.
    #[clap(long = "boardswidth", short = 'x', default_value_t = 0)]
    boards_width: u32,

    /// Resize image to height in amount of boards.
    #[clap(long = "boardsheight", short = 'y', default_value_t = 0)]
    boards_height: u32,

    /// Dimension of a board.
    #[clap(long = "boarddimension", short = 'd', default_value_t = DEFAULT_BOARD_DIMENSION)]
    board_dimension: u32,

    /// Make the output file look like a beads board.
    #[clap(long = "beadstyle", short = 'b')]
    bead_style: bool,

    /// Include translucent colors for the conversion.
    #[clap(long, short)]
    translucent: bool,

    /// Include fluorescent colors for the conversion.
    #[clap(long, short, alias = "flourescent")]
    fluorescent: bool,

    /// Skip the bead color matching.
    #[clap(long = "nocolormatching", short = 'n')]
    no_color_matching: bool,

    /// Convert the image to greyscale.
    #[clap(long, short)]
    grey: bool,

    /// Apply blur filter (0.0 - 10.0).
    #[clap(long, default_value_t = 0.0)]
    blur: f32,

    /// Apply sharpen filter (0.0 - 10.0).
    #[clap(long, default_value_t = 0.0)]
    sharpen: f32,

    /// Apply gamma correction (0.0 - 10.0).
    #[clap(long, default_value_t = 0.0)]
    gamma: f32,

    /// Apply contrast adjustment (-100 - 100).
    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    contrast: f32,

    /// Apply brightness adjustment (-100 - 100).
    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    brightness: f32,

    /// Verbose output.
    #[clap(long, short)]
    verbose: bool,
}

impl Args {
    fn filters(&self) -> FilterOptions {
        FilterOptions {
            blur: self.blur,
            sharpen: self.sharpen,
            gamma: self.gamma,
            contrast: self.contrast,
            brightness: self.brightness,
        }
    }

    fn resize(&self) -> ResizeOptions {
        ResizeOptions {
            width: self.width,
            height: self.height,
            boards_width: self.boards_width,
            boards_height: self.boards_height,
            board_dimension: self.board_dimension,
        }
    }

    fn inclusion(&self) -> InclusionFlags {
        InclusionFlags {
            grey_scale: self.grey,
            translucent: self.translucent,
            fluorescent: self.fluorescent,
            ..Default::default()
        }
    }

    fn process(&self) -> ProcessOptions {
        ProcessOptions {
            bead_style: self.bead_style,
            no_color_matching: self.no_color_matching,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let Some(input_path) = args.input.as_ref().or(args.file.as_ref()) else {
        bail!("no input image given, use --input or pass a file name");
    };

    // A bad palette is fatal before any image work happens.
    let index = if args.no_color_matching {
        None
    } else {
        let entries = load_palette(&args.palette)
            .with_context(|| format!("reading palette {}", args.palette.display()))?;
        Some(PaletteIndex::filter(entries, args.inclusion())?)
    };

    let image = image::open(input_path)
        .with_context(|| format!("reading image {}", input_path.display()))?;
    let (width, height) = image.dimensions();
    info!(width, height, "Image pixels");

    // Filters go before resizing for better results.
    let mut image = apply_filters(image, &args.filters());

    let resize_options = args.resize();
    if let Some((width, height)) = resize_options.target() {
        image = resize(&image, width, height);
    }
    let (width, height) = image.dimensions();
    log_board_usage(width, height);

    let options = args.process();
    if resize_options.target().is_some() || options.bead_style {
        info!(width, height, "Output image pixels");
    }

    let input = image.to_rgba8();
    let output = match &index {
        Some(index) => {
            let pattern = PixelProcessor::new(index, options).run(&input)?;

            if let (Some(path), Some(grid)) = (&args.html, &pattern.matches) {
                save_html(path, grid, &pattern.usage)
                    .with_context(|| format!("writing HTML pattern {}", path.display()))?;
            }
            pattern.image
        }
        None => copy_opaque(&input),
    };

    save_png(&output, &args.output)
        .with_context(|| format!("writing image {}", args.output.display()))?;

    Ok(())
}
