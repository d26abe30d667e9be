//! Renders payment requests as QR codes.
//!
//! The capacity is checked before encoding: a version 40 symbol at error correction
//! level M holds at most 2331 bytes in byte mode.

use qrcode::{
    render::{svg, unicode},
    Color, EcLevel, QrCode,
};
use tracing::debug;

use crate::{config::DEFAULT_QR_MIN_DIMENSION, error::ResolutionError};

pub const MAX_PAYLOAD_BYTES: usize = 2331;

/// A rendered QR code. Dark modules are `true`, the matrix excludes the quiet zone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedCode {
    width: usize,
    modules: Vec<bool>,
    svg: String,
    unicode: String,
}

impl RenderedCode {
    /// Number of modules per side.
    pub const fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Svg document sized for on-screen display, quiet zone included.
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Dense rendering for terminals, two module rows per text line.
    pub fn unicode(&self) -> &str {
        &self.unicode
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CodeRenderer {
    min_dimension: u32,
}

impl Default for CodeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_QR_MIN_DIMENSION)
    }
}

impl CodeRenderer {
    pub const fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }

    pub fn render(&self, payment_request: &str) -> Result<RenderedCode, ResolutionError> {
        if payment_request.len() > MAX_PAYLOAD_BYTES {
            return Err(ResolutionError::EncodingFailed(format!(
                "payload of {} bytes exceeds the capacity of {MAX_PAYLOAD_BYTES} bytes",
                payment_request.len()
            )));
        }

        let code = QrCode::with_error_correction_level(payment_request.as_bytes(), EcLevel::M)
            .map_err(|e| ResolutionError::EncodingFailed(e.to_string()))?;

        let svg = code
            .render::<svg::Color>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .quiet_zone(true)
            .build();
        let unicode = code
            .render::<unicode::Dense1x2>()
            .quiet_zone(true)
            .build();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();

        debug!("rendered {} byte payload as {:?}", payment_request.len(), code.version());
        Ok(RenderedCode {
            width: code.width(),
            modules,
            svg,
            unicode,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{CodeRenderer, RenderedCode, MAX_PAYLOAD_BYTES};
    use crate::error::ErrorKind;

    const INVOICE: &str = "lnbcrt210n1pjg6mqhpp5pza5wzh0csjjuvfpjpv4zdjmg30vedj9ycv5tyfes9x7dp8axy0sdqqcqzzsxqyz5vqsp5vtxg4c5tw2s2zxxya2a7an0psn9mcfmlqctxzntm3sngnpyk3muq9qyyssqf8z5f90yu3wrmsufnnza25qjlnvc6ukdr094ckzn63ktcy6z5fw5mxf9skndpg2p4648gfjfvvx4qg2lqvlryyycg5k7x9h4dw70t4qq37pegm";

    const QUIET_ZONE: usize = 4;
    const SCALE: usize = 4;

    fn decode(code: &RenderedCode) -> anyhow::Result<String> {
        let side = (code.width() + 2 * QUIET_ZONE) * SCALE;
        let mut image = rqrr::PreparedImage::prepare_from_greyscale(side, side, |x, y| {
            let module_x = (x / SCALE).checked_sub(QUIET_ZONE);
            let module_y = (y / SCALE).checked_sub(QUIET_ZONE);
            match (module_x, module_y) {
                (Some(mx), Some(my)) if code.is_dark(mx, my) => 0,
                _ => 255,
            }
        });
        let grids = image.detect_grids();
        let grid = grids
            .first()
            .ok_or_else(|| anyhow::anyhow!("no qr code found"))?;
        let (_, content) = grid
            .decode()
            .map_err(|e| anyhow::anyhow!("decoding failed: {e:?}"))?;
        Ok(content)
    }

    #[test]
    fn test_render_roundtrip() -> anyhow::Result<()> {
        let code = CodeRenderer::default().render(INVOICE)?;
        assert_eq!(INVOICE, decode(&code)?);
        Ok(())
    }

    #[test]
    fn test_render_roundtrip_short_payload() -> anyhow::Result<()> {
        let payload = "lightning:agent@example.com";
        let code = CodeRenderer::default().render(payload)?;
        assert_eq!(payload, decode(&code)?);
        Ok(())
    }

    #[test]
    fn test_svg_is_sized_for_display() -> anyhow::Result<()> {
        let code = CodeRenderer::new(256).render(INVOICE)?;
        assert!(code.svg().starts_with("<?xml"));
        let width = code
            .svg()
            .split("width=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .ok_or_else(|| anyhow::anyhow!("svg has no width"))?
            .parse::<u32>()?;
        assert!(width >= 256, "{width}");
        Ok(())
    }

    #[test]
    fn test_unicode_rendering_packs_two_rows_per_line() -> anyhow::Result<()> {
        let code = CodeRenderer::default().render(INVOICE)?;
        let lines = code.unicode().lines().count();
        assert!(lines > code.width() / 2, "{lines}");
        assert!(lines <= code.width() + 2 * QUIET_ZONE, "{lines}");
        assert!(code.unicode().contains('█'));
        Ok(())
    }

    #[test]
    fn test_payload_too_large() {
        let payload = "a".repeat(MAX_PAYLOAD_BYTES + 1);
        let result = CodeRenderer::default().render(&payload);
        assert_eq!(
            Some(ErrorKind::EncodingFailed),
            result.err().map(|e| e.kind())
        );
    }

    #[test]
    fn test_is_dark_outside_matrix() -> anyhow::Result<()> {
        let code = CodeRenderer::default().render(INVOICE)?;
        assert!(!code.is_dark(code.width(), 0));
        assert!(!code.is_dark(0, code.width()));
        // top left finder pattern
        assert!(code.is_dark(0, 0));
        Ok(())
    }
}
