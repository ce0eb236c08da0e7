//! One-page certificate PDF.
//!
//! Drawn directly with the PDF base-14 fonts, so no font files ship with the
//! binary. The QR code is painted module by module as filled squares.
//! Document handles are not `Send`; render on a blocking thread.

use chrono::{DateTime, Utc};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use crate::credentials::Credential;
use crate::presentation::qr;
use crate::presentation::PresentationError;

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 5.0;
const PT_TO_MM: f32 = 0.3528;

const DESCRIPTION_MAX: usize = 80;
const ADDRESS_MAX: usize = 35;
const ADDRESS_KEEP: usize = 16;

const INK: (u8, u8, u8) = (24, 24, 27);
const MUTED: (u8, u8, u8) = (100, 116, 139);
const FAINT: (u8, u8, u8) = (148, 163, 184);
const CARD: (u8, u8, u8) = (241, 245, 249);
const RULE: (u8, u8, u8) = (203, 213, 225);
const WHITE: (u8, u8, u8) = (255, 255, 255);

/// Render the certificate for `credential`, linking to `verification_url`.
pub fn render_certificate(
    credential: &Credential,
    verification_url: &str,
) -> Result<Vec<u8>, PresentationError> {
    let code = qr::encode(verification_url)?;

    let (doc, page, layer) = PdfDocument::new(
        format!("Credential {}", credential.credential_id),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Certificate",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PresentationError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PresentationError::Pdf(e.to_string()))?;

    let canvas = Canvas {
        layer: doc.get_page(page).get_layer(layer),
        regular,
        bold,
    };

    // Frame and header band
    canvas.outline(MARGIN, MARGIN, PAGE_WIDTH - MARGIN, PAGE_HEIGHT - MARGIN, RULE);
    canvas.fill(MARGIN, PAGE_HEIGHT - MARGIN - 28.0, PAGE_WIDTH - MARGIN, PAGE_HEIGHT - MARGIN, INK);
    canvas.text("CredentialChain", 16.0, 18.0, PAGE_HEIGHT - 24.0, true, WHITE);

    // Body
    canvas.centered("Certificate of Completion", 28.0, 222.0, true, INK);
    canvas.centered("BLOCKCHAIN-VERIFIED CREDENTIAL", 9.0, 212.0, true, MUTED);
    canvas.fill(PAGE_WIDTH / 2.0 - 45.0, 205.0, PAGE_WIDTH / 2.0 + 45.0, 205.3, RULE);

    canvas.centered("This is to certify that", 12.0, 193.0, false, INK);
    canvas.centered(&credential.recipient_name, 32.0, 178.0, true, INK);
    canvas.centered(&credential.recipient_email, 11.0, 168.0, false, FAINT);

    canvas.centered("has successfully completed", 12.0, 155.0, false, INK);
    canvas.fill(30.0, 130.0, PAGE_WIDTH - 30.0, 148.0, CARD);
    canvas.outline(30.0, 130.0, PAGE_WIDTH - 30.0, 148.0, RULE);
    canvas.centered(&credential.credential_type, 20.0, 136.5, true, INK);
    canvas.centered(&truncate_description(&credential.description), 10.0, 120.0, false, MUTED);

    // Issuer and date cards
    let (date, time) = format_issue_date(credential.issue_date);
    let cards = [
        (25.0, "ISSUED BY", credential.issuer_name.clone(), shorten_address(&credential.issuer_address.to_string())),
        (PAGE_WIDTH / 2.0 + 3.0, "DATE ISSUED", date, time),
    ];
    for (x, label, value, detail) in cards {
        canvas.outline(x, 78.0, x + 80.0, 106.0, RULE);
        canvas.text(label, 8.0, x + 5.0, 98.0, true, MUTED);
        canvas.text(&value, 12.0, x + 5.0, 90.0, true, INK);
        canvas.text(&detail, 7.0, x + 5.0, 83.0, false, FAINT);
    }

    // QR code, bottom right
    canvas.qr(&qr::modules(&code), PAGE_WIDTH - 45.0, 24.0, 30.0);
    canvas.text("SCAN TO VERIFY", 6.0, PAGE_WIDTH - 40.5, 19.0, true, INK);

    // Footer
    canvas.centered(&format!("Credential ID: {}", credential.credential_id), 7.0, 14.0, false, FAINT);
    canvas.centered(verification_url, 7.0, 10.0, false, FAINT);

    doc.save_to_bytes()
        .map_err(|e| PresentationError::Pdf(e.to_string()))
}

struct Canvas {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Canvas {
    fn fill(&self, x1: f32, y1: f32, x2: f32, y2: f32, color: (u8, u8, u8)) {
        self.layer.set_fill_color(rgb(color));
        self.layer.add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)));
    }

    fn outline(&self, x1: f32, y1: f32, x2: f32, y2: f32, color: (u8, u8, u8)) {
        self.layer.set_outline_color(rgb(color));
        self.layer.set_outline_thickness(0.75);
        self.layer
            .add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)).with_mode(PaintMode::Stroke));
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, color: (u8, u8, u8)) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    /// Horizontally centred using an average glyph width; base-14 fonts
    /// carry no metrics we can query here.
    fn centered(&self, text: &str, size: f32, y: f32, bold: bool, color: (u8, u8, u8)) {
        let em = if bold { 0.56 } else { 0.52 };
        let width = text.chars().count() as f32 * size * em * PT_TO_MM;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN + 2.0);
        self.text(text, size, x, y, bold, color);
    }

    /// Paint `modules` into a `size` mm square whose lower-left corner is
    /// (`x`, `y`), including a 4-module quiet zone.
    fn qr(&self, modules: &[Vec<bool>], x: f32, y: f32, size: f32) {
        let count = modules.len() as f32 + 8.0;
        let cell = size / count;

        self.fill(x, y, x + size, y + size, WHITE);
        self.layer.set_fill_color(rgb(INK));
        for (row, cells) in modules.iter().enumerate() {
            // Row 0 is the top of the symbol.
            let top = y + size - (row as f32 + 4.0) * cell;
            for (col, dark) in cells.iter().enumerate() {
                if *dark {
                    let left = x + (col as f32 + 4.0) * cell;
                    self.layer
                        .add_rect(Rect::new(Mm(left), Mm(top - cell), Mm(left + cell), Mm(top)));
                }
            }
        }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

/// `Month DD, YYYY` and `HH:MM AM/PM UTC`.
pub fn format_issue_date(issue_date: Option<DateTime<Utc>>) -> (String, String) {
    match issue_date {
        Some(dt) => (
            dt.format("%B %d, %Y").to_string(),
            dt.format("%I:%M %p UTC").to_string(),
        ),
        None => ("Unknown".to_string(), String::new()),
    }
}

/// Long descriptions are cut to 77 characters plus an ellipsis.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_MAX {
        return description.to_string();
    }
    let kept: String = description.chars().take(DESCRIPTION_MAX - 3).collect();
    format!("{}...", kept)
}

/// Addresses longer than 35 characters keep 16 on each side.
pub fn shorten_address(address: &str) -> String {
    let len = address.chars().count();
    if len <= ADDRESS_MAX {
        return address.to_string();
    }
    let head: String = address.chars().take(ADDRESS_KEEP).collect();
    let tail: String = address.chars().skip(len - ADDRESS_KEEP).collect();
    format!("{}...{}", head, tail)
}
