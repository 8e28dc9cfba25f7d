//! Terminal rendering of pairing QR codes.

use hush_core::error::HushError;
use qrcode::{Color, EcLevel, QrCode};

/// Light modules around the code; scanners need a margin on dark terminals.
const QUIET_ZONE: usize = 2;

/// Render `qr_data` as text, two module rows per line using half blocks.
///
/// Dark modules are drawn as spaces and light modules as blocks, so the code
/// reads correctly on a dark terminal background.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, HushError> {
    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| HushError::Channel(format!("QR generation failed: {e}")))?;

    let width = code.width();
    let colors: Vec<Color> = code.into_colors();
    let side = width + QUIET_ZONE * 2;
    let light = |row: usize, col: usize| -> bool {
        if row < QUIET_ZONE || col < QUIET_ZONE {
            return true;
        }
        let (r, c) = (row - QUIET_ZONE, col - QUIET_ZONE);
        if r >= width || c >= width {
            return true;
        }
        colors[r * width + c] == Color::Light
    };

    let mut out = String::with_capacity(side * (side / 2 + 1) * 3);
    for row in (0..side).step_by(2) {
        for col in 0..side {
            let top = light(row, col);
            let bottom = row + 1 < side && light(row + 1, col);
            out.push(match (top, bottom) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_terminal_is_square_ish() {
        let qr = generate_qr_terminal("2@abc,def,ghi").unwrap();
        let lines: Vec<&str> = qr.lines().collect();
        let cols = lines[0].chars().count();
        assert!(cols > 20);
        assert_eq!(lines.len(), cols.div_ceil(2));
        assert!(lines.iter().all(|l| l.chars().count() == cols));
    }

    #[test]
    fn test_qr_terminal_has_light_border() {
        let qr = generate_qr_terminal("pairing").unwrap();
        let first = qr.lines().next().unwrap();
        assert!(first.chars().all(|c| c == '█'));
    }
}
