use crate::workflows::analysis::AnalysisReport;
use std::fmt::Write as _;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
/// Rough average glyph width of Helvetica as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;
const SOURCE_PREVIEW_CHARS: usize = 500;

/// Turns a finished report into a binary document.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, report: &AnalysisReport) -> Vec<u8>;

    fn file_name(&self) -> &'static str;

    fn content_type(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    const fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// A4 PDF report using the built-in Helvetica faces.
#[derive(Debug, Clone, Default)]
pub struct PdfReportRenderer;

impl DocumentRenderer for PdfReportRenderer {
    fn render(&self, report: &AnalysisReport) -> Vec<u8> {
        let mut layout = PageLayout::default();

        layout.text("Copycheck Analysis Report", 24.0, FontStyle::Bold, Align::Center);
        layout.gap(10.0);
        layout.text(
            &format!(
                "Generated on {}",
                report.generated_at.format("%Y-%m-%d %H:%M")
            ),
            12.0,
            FontStyle::Italic,
            Align::Center,
        );
        layout.gap(20.0);

        layout.text("Analyzed Text:", 14.0, FontStyle::Bold, Align::Left);
        layout.gap(5.0);
        layout.text(&source_preview(&report.source_text), 12.0, FontStyle::Regular, Align::Left);
        layout.gap(10.0);

        layout.text("Analysis Results:", 14.0, FontStyle::Bold, Align::Left);
        layout.gap(10.0);
        layout.text(
            &format!("Overall Score: {}%", report.summary.overall_percent()),
            12.0,
            FontStyle::Bold,
            Align::Left,
        );
        layout.gap(10.0);

        for entry in report.scorecard.iter() {
            layout.text(
                &format!("{}: {:.1}/10", entry.criterion.label(), entry.score),
                12.0,
                FontStyle::Bold,
                Align::Left,
            );
            if !entry.suggestion.is_empty() {
                layout.text(
                    &format!("Suggestion: {}", entry.suggestion),
                    12.0,
                    FontStyle::Italic,
                    Align::Left,
                );
            }
            layout.gap(5.0);
        }

        layout.gap(10.0);
        layout.text("Areas for Improvement:", 14.0, FontStyle::Bold, Align::Left);
        layout.gap(5.0);
        layout.text(
            &report.summary.improvement_summary(),
            12.0,
            FontStyle::Regular,
            Align::Left,
        );
        layout.text(report.summary.final_comment, 12.0, FontStyle::Italic, Align::Left);

        write_document(&layout.finish())
    }

    fn file_name(&self) -> &'static str {
        "copycheck_analysis.pdf"
    }

    fn content_type(&self) -> &'static str {
        "application/pdf"
    }
}

fn source_preview(text: &str) -> String {
    match text.char_indices().nth(SOURCE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Accumulates page content streams, breaking pages when the cursor reaches the margin.
struct PageLayout {
    pages: Vec<String>,
    current: String,
    cursor: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }
}

impl PageLayout {
    fn gap(&mut self, points: f32) {
        self.cursor -= points;
    }

    fn text(&mut self, text: &str, size: f32, style: FontStyle, align: Align) {
        let line_height = size * 1.25;
        for line in wrap(text, max_chars(size)) {
            if self.cursor - line_height < MARGIN {
                self.break_page();
            }
            self.cursor -= line_height;
            let x = match align {
                Align::Left => MARGIN,
                Align::Center => {
                    let width = line.chars().count() as f32 * size * AVERAGE_GLYPH_WIDTH;
                    ((PAGE_WIDTH - width) / 2.0).max(MARGIN)
                }
            };
            let _ = writeln!(
                self.current,
                "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
                style.resource(),
                size,
                x,
                self.cursor,
                escape(&line)
            );
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn finish(mut self) -> Vec<String> {
        self.pages.push(self.current);
        self.pages
    }
}

fn max_chars(size: f32) -> usize {
    (((PAGE_WIDTH - 2.0 * MARGIN) / (size * AVERAGE_GLYPH_WIDTH)).floor() as usize).max(1)
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

/// Escapes a string literal for a content stream. Characters outside Latin-1 become `?`.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' '..='~' => escaped.push(ch),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(escaped, "\\{:03o}", ch as u32);
            }
            _ => escaped.push('?'),
        }
    }
    escaped
}

/// `pages` is never empty; `PageLayout::finish` always yields the page in progress.
fn write_document(pages: &[String]) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3-5 fonts, then a page and its content stream per page.
    let first_page = 6;
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page + i * 2).collect();
    let mut objects: Vec<String> = Vec::with_capacity(5 + pages.len() * 2);

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{kids}] /Count {} >>",
        pages.len()
    ));
    for base_font in ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique"] {
        objects.push(format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>"
        ));
    }
    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >> >> /Contents {} 0 R >>",
            id + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{page}endstream",
            page.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", index + 1, body);
    }

    let xref = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    );

    out.into_bytes()
}
