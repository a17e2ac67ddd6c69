//! Terminal UI rendering for Marquee

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{self, Context},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame,
};

use marquee_core::{App, Extent, Geometry, Mode, Point, Rgb, Shape, TextMetrics};

// Catppuccin Mocha colors
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);

const TEXT_PANE_HEIGHT: u16 = 6;
const ELLIPSE_SEGMENTS: usize = 48;

struct Panes {
    title: Rect,
    canvas: Rect,
    text: Rect,
    status: Rect,
}

fn panes(area: Rect) -> Panes {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                 // Title bar
            Constraint::Min(0),                    // Image
            Constraint::Length(TEXT_PANE_HEIGHT), // Marker text
            Constraint::Length(1),                 // Status bar
        ])
        .split(area);

    Panes {
        title: chunks[0],
        canvas: chunks[1],
        text: chunks[2],
        status: chunks[3],
    }
}

fn canvas_block(app: &App) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title(format!("Image - {}", app.surface.tool.shape_for(Default::default()).as_str()))
}

/// Cells the image is drawn into, inside the canvas border
pub fn canvas_area(frame_area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(panes(frame_area).canvas)
}

pub fn draw(frame: &mut Frame, app: &App) {
    let panes = panes(frame.area());

    draw_title_bar(frame, app, panes.title);
    draw_canvas(frame, app, panes.canvas);
    draw_text_pane(frame, app, panes.text);
    draw_status_bar(frame, app, panes.status);

    if app.mode == Mode::Help {
        draw_help(frame);
    }
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let size = app
        .image
        .as_ref()
        .map(|i| format!(" ({}x{})", i.width, i.height))
        .unwrap_or_default();
    let selected = app.selected_id();
    let selected = if selected.is_some() {
        format!(" #{}", selected)
    } else {
        String::new()
    };

    let title_text = format!(
        " Marquee - {}{} [{} markers]{}",
        app.title(),
        size,
        app.surface.markers().len(),
        selected
    );

    let title_bar = Paragraph::new(title_text).style(Style::default().fg(TEXT).bg(SURFACE0));
    frame.render_widget(title_bar, area);
}

fn draw_canvas(frame: &mut Frame, app: &App, area: Rect) {
    let block = canvas_block(app);
    let inner = block.inner(area);
    let image = app.surface.image_size();
    let view = CanvasView::new(inner, image);

    let widget = canvas::Canvas::default()
        .block(block)
        .background_color(Color::Reset)
        .x_bounds([0.0, image.width.max(1.0)])
        .y_bounds([0.0, image.height.max(1.0)])
        .paint(|ctx| {
            let mut canvas = TerminalCanvas::new(ctx, &view);
            app.draw(&mut canvas);
        });

    frame.render_widget(widget, area);
}

fn draw_text_pane(frame: &mut Frame, app: &App, area: Rect) {
    let selected = app.selected_id();
    let (title, style) = if selected.is_some() {
        (format!("Text #{}", selected), Style::default().fg(GREEN))
    } else {
        ("Select text to describe".to_string(), Style::default().fg(SUBTEXT0))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title);

    let body = if app.text.is_enabled() {
        let mut lines: Vec<Line> = app
            .active_text()
            .split('\n')
            .map(|l| Line::from(l.to_string()))
            .collect();
        if let Some(last) = lines.last_mut() {
            last.spans.push(Span::styled("_", Style::default().fg(SUBTEXT0)));
        }
        lines
    } else {
        Vec::new()
    };

    // Keep the end of long text in view
    let inner_height = block.inner(area).height as usize;
    let scroll = body.len().saturating_sub(inner_height) as u16;

    let paragraph = Paragraph::new(body)
        .block(block)
        .style(Style::default().fg(TEXT))
        .scroll((scroll, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_str = match app.mode {
        Mode::Normal => "NORMAL",
        Mode::Help => "HELP",
    };

    let status = app.status_message.as_deref().unwrap_or("");
    let help_hint = "drag mark | click select | Tab next | Alt+Del remove | ^S export | F1 help";

    let status_text = format!(
        " {} | {}",
        mode_str,
        if status.is_empty() { help_hint } else { status },
    );

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));
    frame.render_widget(status_bar, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(62, 22, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let heading = |s: &'static str| {
        Line::from(Span::styled(s, Style::default().fg(MAUVE).add_modifier(Modifier::BOLD)))
    };

    let help_text = vec![
        heading("Markers"),
        Line::from("  drag           Draw a marker (Shift: other shape)"),
        Line::from("  click          Select; click again to cycle a stack"),
        Line::from("  Tab            Next marker by id"),
        Line::from("  Alt+Backspace  Remove selected marker"),
        Line::from("  F2 / F3        Toggle fill / default shape"),
        Line::from(""),
        heading("Text"),
        Line::from("  type           Edit the selected marker's text"),
        Line::from("  Backspace      Delete (hold to repeat)"),
        Line::from("  Ctrl+Backspace Delete word"),
        Line::from("  Ctrl+C         Copy text"),
        Line::from(""),
        heading("File"),
        Line::from("  Ctrl+S         Export annotations"),
        Line::from("  Esc / Ctrl+Q   Quit"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Maps terminal cells onto image pixels for one canvas rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasView {
    pub area: Rect,
    pub image: Extent,
}

impl CanvasView {
    pub fn new(area: Rect, image: Extent) -> Self {
        Self { area, image }
    }

    /// Image-space size of one terminal cell
    pub fn cell_size(&self) -> Extent {
        if self.area.width == 0 || self.area.height == 0 {
            return Extent::ZERO;
        }
        Extent::new(
            self.image.width / f64::from(self.area.width),
            self.image.height / f64::from(self.area.height),
        )
    }

    /// Center of the cell in image pixels, or `None` outside the canvas
    pub fn cell_to_image(&self, column: u16, row: u16) -> Option<Point> {
        let inside = column >= self.area.x
            && column < self.area.right()
            && row >= self.area.y
            && row < self.area.bottom();
        if !inside {
            return None;
        }
        Some(self.clamped(column, row))
    }

    /// Like `cell_to_image`, but positions outside the canvas stick to its edge
    pub fn clamped(&self, column: u16, row: u16) -> Point {
        let cell = self.cell_size();
        let col = column
            .clamp(self.area.x, self.area.right().saturating_sub(1).max(self.area.x))
            - self.area.x;
        let row = row
            .clamp(self.area.y, self.area.bottom().saturating_sub(1).max(self.area.y))
            - self.area.y;
        Point::new(
            (f64::from(col) + 0.5) * cell.width,
            (f64::from(row) + 0.5) * cell.height,
        )
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// [`marquee_core::Canvas`] over a ratatui canvas context.
///
/// Ratatui's y axis points up, so every y coordinate is flipped against the
/// image height. Fills are drawn as horizontal scanlines one braille dot apart;
/// translucent fills skip every other scanline.
pub struct TerminalCanvas<'a, 'b> {
    ctx: &'a mut Context<'b>,
    height: f64,
    cell: Extent,
}

impl<'a, 'b> TerminalCanvas<'a, 'b> {
    pub fn new(ctx: &'a mut Context<'b>, view: &CanvasView) -> Self {
        Self {
            ctx,
            height: view.image.height,
            cell: view.cell_size(),
        }
    }

    fn flip(&self, y: f64) -> f64 {
        self.height - y
    }

    fn line(&mut self, from: Point, to: Point, color: Color) {
        let (y1, y2) = (self.flip(from.y), self.flip(to.y));
        self.ctx.draw(&canvas::Line {
            x1: from.x,
            y1,
            x2: to.x,
            y2,
            color,
        });
    }

    /// Braille dots are a quarter of a cell high
    fn scanline_step(&self) -> f64 {
        (self.cell.height / 4.0).max(f64::EPSILON)
    }
}

impl marquee_core::Canvas for TerminalCanvas<'_, '_> {
    fn clear(&mut self, size: Extent) {
        self.ctx.draw(&canvas::Rectangle {
            x: 0.0,
            y: 0.0,
            width: size.width,
            height: size.height,
            color: SURFACE1,
        });
        self.ctx.layer();
    }

    fn stroke_shape(&mut self, shape: Shape, geometry: &Geometry, color: Rgb) {
        let color = to_color(color);
        match shape {
            Shape::Rectangle => {
                self.ctx.draw(&canvas::Rectangle {
                    x: geometry.origin.x,
                    y: self.flip(geometry.bottom()),
                    width: geometry.extent.width,
                    height: geometry.extent.height,
                    color,
                });
            }
            Shape::Ellipse => {
                let c = geometry.center();
                let (a, b) = (geometry.extent.width / 2.0, geometry.extent.height / 2.0);
                let point = |i: usize| {
                    let t = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
                    Point::new(c.x + a * t.cos(), c.y + b * t.sin())
                };
                for i in 0..ELLIPSE_SEGMENTS {
                    self.line(point(i), point(i + 1), color);
                }
            }
        }
    }

    fn fill_shape(&mut self, shape: Shape, geometry: &Geometry, color: Rgb, alpha: f64) {
        if alpha <= 0.0 || geometry.extent.height <= 0.0 {
            return;
        }
        let color = to_color(color);
        let step = self.scanline_step();
        let skip = alpha < 1.0;
        let c = geometry.center();
        let (a, b) = (geometry.extent.width / 2.0, geometry.extent.height / 2.0);

        let mut y = geometry.origin.y;
        let mut row = 0usize;
        while y <= geometry.bottom() {
            if !skip || row % 2 == 0 {
                let (left, right) = match shape {
                    Shape::Rectangle => (geometry.origin.x, geometry.right()),
                    Shape::Ellipse => {
                        let dy = (y - c.y) / b;
                        let half = a * (1.0 - dy * dy).max(0.0).sqrt();
                        (c.x - half, c.x + half)
                    }
                };
                self.line(Point::new(left, y), Point::new(right, y), color);
            }
            y += step;
            row += 1;
        }
    }

    fn fill_text(&mut self, text: &str, at: Point, color: Rgb) {
        let y = self.flip(at.y);
        self.ctx.print(
            at.x,
            y,
            Line::from(Span::styled(text.to_string(), Style::default().fg(to_color(color)))),
        );
    }

    /// One cell per character, one cell tall
    fn measure_text(&self, text: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * self.cell.width,
            ascent: self.cell.height,
        }
    }
}
