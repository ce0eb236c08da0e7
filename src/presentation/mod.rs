//! Presentation artifacts: verification QR codes and certificate PDFs.
//!
//! Pure functions of a credential record; nothing here talks to the chain.

pub mod pdf;
pub mod qr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("QR code generation failed: {0}")]
    Qr(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
