//! HTML rendering of a bead pattern: one table cell per bead, followed by the
//! shopping list.

use std::{
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::Path,
};

use crate::{
    processor::MatchedGrid,
    usage::UsageTable,
    Result,
};

const STYLE: &str = "table.beads { border-collapse: collapse; }\n\
table.beads td { width: 12px; height: 12px; padding: 0; border: 1px solid #e1e1e1; }\n\
table.usage td { padding: 2px 8px; }\n";

pub fn write_html(mut out: impl Write, grid: &MatchedGrid<'_>, usage: &UsageTable) -> Result<()> {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>\n<head>\n<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>Bead pattern</title>")?;
    writeln!(out, "<style>\n{STYLE}</style>\n</head>\n<body>")?;
    writeln!(
        out,
        "<p>{} &times; {} beads, {} colors</p>",
        grid.width(),
        grid.height(),
        usage.distinct()
    )?;

    writeln!(out, "<table class=\"beads\">")?;
    for row in grid.rows() {
        write!(out, "<tr>")?;
        for bead in row {
            write!(
                out,
                "<td style=\"background-color:{}\" title=\"{}\"></td>",
                bead.color.to_hex(),
                escape(&bead.name)
            )?;
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</table>")?;

    writeln!(out, "<table class=\"usage\">")?;
    writeln!(out, "<tr><th>Color</th><th>Beads</th></tr>")?;
    for (name, count) in usage.sorted() {
        writeln!(out, "<tr><td>{}</td><td>{count}</td></tr>", escape(name))?;
    }
    writeln!(out, "</table>\n</body>\n</html>")?;

    out.flush()?;
    Ok(())
}

pub fn save_html(path: impl AsRef<Path>, grid: &MatchedGrid<'_>, usage: &UsageTable) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_html(file, grid, usage)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use image::{
        Rgba,
        RgbaImage,
    };

    use super::*;
    use crate::{
        color::RgbColor,
        palette_index::{
            BeadKind,
            InclusionFlags,
            PaletteEntry,
            PaletteIndex,
        },
        processor::{
            PixelProcessor,
            ProcessOptions,
        },
    };

    #[test]
    fn renders_cells_and_usage() {
        let index = PaletteIndex::filter(
            [
                PaletteEntry::new("black", RgbColor::new(0, 0, 0), BeadKind::default()),
                PaletteEntry::new("<white>", RgbColor::new(255, 255, 255), BeadKind::default()),
            ],
            InclusionFlags::default(),
        )
        .unwrap();

        let mut input = RgbaImage::from_pixel(3, 2, Rgba([5, 5, 5, 255]));
        input.put_pixel(2, 1, Rgba([250, 250, 250, 255]));

        let pattern = PixelProcessor::new(&index, ProcessOptions::default())
            .run(&input)
            .unwrap();

        let mut html = Vec::new();
        write_html(&mut html, pattern.matches.as_ref().unwrap(), &pattern.usage).unwrap();
        let html = String::from_utf8(html).unwrap();

        assert_eq!(html.matches("<td style=").count(), 6);
        assert_eq!(html.matches("background-color:#000000").count(), 5);
        assert!(html.contains("title=\"&lt;white&gt;\""));
        assert!(html.contains("<tr><td>black</td><td>5</td></tr>"));
        assert!(html.contains("<tr><td>&lt;white&gt;</td><td>1</td></tr>"));
        assert!(!html.contains("<white>"));
    }

    #[test]
    fn saves_to_file() {
        let index = PaletteIndex::filter(
            [PaletteEntry::new("red", RgbColor::new(200, 0, 0), BeadKind::default())],
            InclusionFlags::default(),
        )
        .unwrap();
        let pattern = PixelProcessor::new(&index, ProcessOptions::default())
            .run(&RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255])))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pattern.html");
        save_html(&path, pattern.matches.as_ref().unwrap(), &pattern.usage).unwrap();

        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("background-color:#c80000"));
    }
}
