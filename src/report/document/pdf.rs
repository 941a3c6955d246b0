use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use super::layout::{DrawOp, Font, Layout, PageGeometry, Rgb};
use super::text::encode_win_ansi;

// Fixed object numbers; page i uses 6 + 2i and its content stream 7 + 2i
const CATALOG_ID: i32 = 1;
const PAGE_TREE_ID: i32 = 2;
const INFO_ID: i32 = 3;
const REGULAR_FONT_ID: i32 = 4;
const BOLD_FONT_ID: i32 = 5;
const FIRST_PAGE_ID: i32 = 6;

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

fn page_id(index: usize) -> Ref {
    Ref::new(FIRST_PAGE_ID + 2 * index as i32)
}

fn content_id(index: usize) -> Ref {
    Ref::new(FIRST_PAGE_ID + 2 * index as i32 + 1)
}

/// Writes the laid-out pages as a PDF with uncompressed content streams
pub fn serialize(layout: &Layout, geometry: &PageGeometry, title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let page_tree = Ref::new(PAGE_TREE_ID);
    let regular_font = Ref::new(REGULAR_FONT_ID);
    let bold_font = Ref::new(BOLD_FONT_ID);
    let page_ids: Vec<Ref> = (0..layout.pages.len()).map(page_id).collect();

    pdf.catalog(Ref::new(CATALOG_ID)).pages(page_tree);
    pdf.pages(page_tree)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.document_info(Ref::new(INFO_ID))
        .title(TextStr(title))
        .producer(TextStr(env!("CARGO_PKG_NAME")));

    pdf.type1_font(regular_font)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_font)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (index, page) in layout.pages.iter().enumerate() {
        let mut writer = pdf.page(page_ids[index]);
        writer.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height));
        writer.parent(page_tree);
        writer.contents(content_id(index));
        writer
            .resources()
            .fonts()
            .pair(REGULAR_FONT, regular_font)
            .pair(BOLD_FONT, bold_font);
        writer.finish();

        let stream = draw_page(&page.ops, geometry.height);
        pdf.stream(content_id(index), &stream);
    }

    pdf.finish()
}

fn draw_page(ops: &[DrawOp], page_height: f32) -> Vec<u8> {
    let mut content = Content::new();

    for op in ops {
        match op {
            DrawOp::Text(run) => {
                let font = match run.font {
                    Font::Regular => REGULAR_FONT,
                    Font::Bold => BOLD_FONT,
                };
                let (r, g, b) = unit_rgb(run.color);
                // PDF space grows upward from the baseline
                let baseline = page_height - run.y - run.size;

                content.begin_text();
                content.set_font(font, run.size);
                content.set_fill_rgb(r, g, b);
                content.next_line(run.x, baseline);
                content.show(Str(&encode_win_ansi(&run.text)));
                content.end_text();
            }
            DrawOp::Rule { x1, x2, y, color } => {
                let (r, g, b) = unit_rgb(*color);
                let y = page_height - y;

                content.set_stroke_rgb(r, g, b);
                content.set_line_width(0.5);
                content.move_to(*x1, y);
                content.line_to(*x2, y);
                content.stroke();
            }
        }
    }

    content.finish().to_vec()
}

fn unit_rgb(Rgb(r, g, b): Rgb) -> (f32, f32, f32) {
    (
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
    )
}
