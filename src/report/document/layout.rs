//! Page layout for the orders document.
//!
//! [`Composer`] is a small state machine that walks the rows once, in input
//! order, breaking pages by position and carrying the running total. It
//! produces device-independent draw operations; serialization happens later.

use rust_decimal::Decimal;

use crate::models::Order;
use crate::report::{money, RenderError};

use super::text::{ellipsize, estimate_width};

pub const TITLE_COLOR: Rgb = Rgb(0x8B, 0x45, 0x13);
pub const TEXT_COLOR: Rgb = Rgb(0x44, 0x44, 0x44);
pub const SECONDARY_COLOR: Rgb = Rgb(0x77, 0x77, 0x77);
pub const RULE_COLOR: Rgb = Rgb(0xAA, 0xAA, 0xAA);

const COLUMN_X: [f32; 5] = [50.0, 150.0, 300.0, 400.0, 500.0];
const COLUMN_TITLES: [&str; 5] = ["Order #", "Customer / Type", "Date", "Status", "Amount"];
const CUSTOMER_WIDTH: f32 = 140.0;
const BODY_SIZE: f32 = 10.0;
const SECONDARY_SIZE: f32 = 8.0;
const TOTAL_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// Text placed with its top edge at `y`, measured from the top of the page
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: Font,
    pub color: Rgb,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextRun),
    Rule { x1: f32, x2: f32, y: f32, color: Rgb },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
    pub rows: usize,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            DrawOp::Rule { .. } => None,
        })
    }
}

/// Fixed canvas, in points, top-down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Top of the first row on every page
    pub rows_top: f32,
    pub row_height: f32,
    /// A row whose top lies below this starts a new page
    pub break_threshold: f32,
    /// Room needed by the closing rule and total line
    pub footer_height: f32,
    pub max_pages: usize,
}

impl Default for PageGeometry {
    /// US Letter
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 50.0,
            rows_top: 150.0,
            row_height: 30.0,
            break_threshold: 720.0,
            footer_height: 30.0,
            max_pages: 1000,
        }
    }
}

impl PageGeometry {
    pub fn rows_per_page(&self) -> usize {
        ((self.break_threshold - self.rows_top) / self.row_height).floor() as usize + 1
    }

    fn content_right(&self) -> f32 {
        self.width - self.margin
    }

    fn content_bottom(&self) -> f32 {
        self.height - self.margin
    }
}

/// Text of the title block, prepared by the caller
#[derive(Debug, Clone)]
pub struct HeaderText {
    pub company_name: String,
    pub generated: String,
    /// `None` when no filter is set
    pub filters: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutState {
    HeaderPending,
    RowsInProgress,
    Finalizing,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub pages: Vec<Page>,
    pub total: Decimal,
}

pub struct Composer<'a> {
    orders: &'a [Order],
    header: HeaderText,
    geometry: PageGeometry,
    state: LayoutState,
    pages: Vec<Page>,
    cursor: f32,
    next_row: usize,
    running_total: Decimal,
}

impl<'a> Composer<'a> {
    pub fn new(orders: &'a [Order], header: HeaderText, geometry: PageGeometry) -> Self {
        Self {
            orders,
            header,
            geometry,
            state: LayoutState::HeaderPending,
            pages: Vec::new(),
            cursor: geometry.rows_top,
            next_row: 0,
            running_total: Decimal::ZERO,
        }
    }

    pub fn state(&self) -> LayoutState {
        self.state
    }

    pub fn running_total(&self) -> Decimal {
        self.running_total
    }

    /// Performs one transition. Any error leaves the composer in
    /// [`LayoutState::Failed`] for good.
    pub fn step(&mut self) -> Result<LayoutState, RenderError> {
        let result = match self.state {
            LayoutState::HeaderPending => self.emit_header(),
            LayoutState::RowsInProgress => self.place_next_row(),
            LayoutState::Finalizing => self.emit_total(),
            LayoutState::Done | LayoutState::Failed => Ok(()),
        };

        if let Err(err) = result {
            self.state = LayoutState::Failed;
            return Err(err);
        }
        Ok(self.state)
    }

    pub fn run(mut self) -> Result<Layout, RenderError> {
        while self.state != LayoutState::Done {
            self.step()?;
        }
        self.stamp_page_numbers();

        Ok(Layout {
            pages: self.pages,
            total: money::to_money(self.running_total),
        })
    }

    fn emit_header(&mut self) -> Result<(), RenderError> {
        let mut page = Page::default();
        let width = self.geometry.width;

        let company = &self.header.company_name;
        page.ops.push(text_centered(width, 50.0, 20.0, Font::Regular, TITLE_COLOR, company));
        page.ops.push(text_centered(
            width,
            75.0,
            12.0,
            Font::Regular,
            TITLE_COLOR,
            "Orders Report",
        ));

        let generated = format!("Generated: {}", self.header.generated);
        let right = self.geometry.content_right() - estimate_width(&generated, BODY_SIZE);
        page.ops.push(text(right, 95.0, BODY_SIZE, Font::Regular, TEXT_COLOR, generated));

        if let Some(filters) = &self.header.filters {
            page.ops.push(text(
                self.geometry.margin,
                108.0,
                BODY_SIZE,
                Font::Regular,
                TEXT_COLOR,
                format!("Filters: {filters}"),
            ));
        }

        self.push_column_header(&mut page);
        self.pages.push(page);
        self.cursor = self.geometry.rows_top;
        self.state = LayoutState::RowsInProgress;
        Ok(())
    }

    fn place_next_row(&mut self) -> Result<(), RenderError> {
        let orders = self.orders;
        let Some(order) = orders.get(self.next_row) else {
            self.state = LayoutState::Finalizing;
            return Ok(());
        };

        if self.cursor > self.geometry.break_threshold {
            self.start_continuation_page()?;
        }

        self.running_total = self
            .running_total
            .checked_add(order.agreed_price)
            .ok_or_else(|| RenderError::Layout("running total overflowed".to_string()))?;

        let y = self.cursor;
        let ops = [
            text(COLUMN_X[0], y, BODY_SIZE, Font::Regular, TEXT_COLOR, order.order_number.clone()),
            text(
                COLUMN_X[1],
                y,
                BODY_SIZE,
                Font::Regular,
                TEXT_COLOR,
                ellipsize(&order.customer_name, CUSTOMER_WIDTH, BODY_SIZE),
            ),
            text(
                COLUMN_X[2],
                y,
                BODY_SIZE,
                Font::Regular,
                TEXT_COLOR,
                order.created_at.format("%Y-%m-%d").to_string(),
            ),
            text(
                COLUMN_X[3],
                y,
                BODY_SIZE,
                Font::Regular,
                TEXT_COLOR,
                order.status.as_str().to_string(),
            ),
            text(
                COLUMN_X[4],
                y,
                BODY_SIZE,
                Font::Regular,
                TEXT_COLOR,
                money::format_amount(order.agreed_price),
            ),
            text(
                COLUMN_X[1],
                y + 12.0,
                SECONDARY_SIZE,
                Font::Regular,
                SECONDARY_COLOR,
                ellipsize(&order.furniture_type, CUSTOMER_WIDTH, SECONDARY_SIZE),
            ),
        ];

        let page = self.current_page()?;
        page.ops.extend(ops);
        page.rows += 1;

        self.cursor += self.geometry.row_height;
        self.next_row += 1;
        Ok(())
    }

    fn emit_total(&mut self) -> Result<(), RenderError> {
        if self.cursor + self.geometry.footer_height > self.geometry.content_bottom() {
            self.start_continuation_page()?;
        }

        let y = self.cursor;
        let (left, right) = (self.geometry.margin, self.geometry.content_right());
        let total = money::format_amount(self.running_total);

        let page = self.current_page()?;
        page.ops.push(DrawOp::Rule {
            x1: left,
            x2: right,
            y,
            color: RULE_COLOR,
        });
        let label = "Total:".to_string();
        page.ops.push(text(COLUMN_X[3], y + 15.0, TOTAL_SIZE, Font::Bold, TEXT_COLOR, label));
        page.ops.push(text(COLUMN_X[4], y + 15.0, TOTAL_SIZE, Font::Bold, TEXT_COLOR, total));

        self.cursor = y + self.geometry.footer_height;
        self.state = LayoutState::Done;
        Ok(())
    }

    fn start_continuation_page(&mut self) -> Result<(), RenderError> {
        if self.pages.len() >= self.geometry.max_pages {
            return Err(RenderError::PageLimitExceeded {
                limit: self.geometry.max_pages,
            });
        }

        let mut page = Page::default();
        page.ops.push(text(
            self.geometry.margin,
            50.0,
            BODY_SIZE,
            Font::Regular,
            SECONDARY_COLOR,
            format!("{} - Orders Report (continued)", self.header.company_name),
        ));
        self.push_column_header(&mut page);
        self.pages.push(page);
        self.cursor = self.geometry.rows_top;
        Ok(())
    }

    fn push_column_header(&self, page: &mut Page) {
        let y = self.geometry.rows_top - 25.0;
        for (x, title) in COLUMN_X.iter().zip(COLUMN_TITLES) {
            page.ops.push(text(*x, y, BODY_SIZE, Font::Bold, TEXT_COLOR, title.to_string()));
        }
        page.ops.push(DrawOp::Rule {
            x1: self.geometry.margin,
            x2: self.geometry.content_right(),
            y: y + 15.0,
            color: RULE_COLOR,
        });
    }

    fn current_page(&mut self) -> Result<&mut Page, RenderError> {
        self.pages
            .last_mut()
            .ok_or_else(|| RenderError::Layout("no page has been started".to_string()))
    }

    fn stamp_page_numbers(&mut self) {
        let count = self.pages.len();
        let y = self.geometry.content_bottom() + 15.0;
        let width = self.geometry.width;
        for (index, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {count}", index + 1);
            page.ops.push(text_centered(
                width,
                y,
                SECONDARY_SIZE,
                Font::Regular,
                SECONDARY_COLOR,
                &label,
            ));
        }
    }
}

fn text(x: f32, y: f32, size: f32, font: Font, color: Rgb, text: String) -> DrawOp {
    DrawOp::Text(TextRun {
        x,
        y,
        size,
        font,
        color,
        text,
    })
}

fn text_centered(
    page_width: f32,
    y: f32,
    size: f32,
    font: Font,
    color: Rgb,
    value: &str,
) -> DrawOp {
    let x = ((page_width - estimate_width(value, size)) / 2.0).max(0.0);
    text(x, y, size, font, color, value.to_string())
}
