//! Page size aliases
//!
//! The configuration file accepts ISO 216 names (A, B and C series),
//! the common North American formats, an `L-` prefix for landscape,
//! or an explicit `width,height` pair in points.

const MM_TO_PT: f64 = 72.0 / 25.4;

/// Resolve a page-size string to `(width, height)` in points.
pub fn parse(value: &str) -> Option<(f64, f64)> {
    let value = value.trim();
    if let Some(portrait) = value.strip_prefix("L-").and_then(parse_portrait) {
        return Some((portrait.1, portrait.0));
    }
    if let Some(size) = parse_portrait(value) {
        return Some(size);
    }
    // explicit "width,height" in points
    let (w, h) = value.split_once(',')?;
    let w: f64 = w.trim().parse().ok()?;
    let h: f64 = h.trim().parse().ok()?;
    if w > 0.0 && h > 0.0 {
        Some((w, h))
    } else {
        None
    }
}

fn parse_portrait(value: &str) -> Option<(f64, f64)> {
    let named = match value.to_ascii_uppercase().as_str() {
        "LETTER" => (612.0, 792.0),
        "LEGAL" => (612.0, 1008.0),
        "TABLOID" => (792.0, 1224.0),
        "LEDGER" => (1224.0, 792.0),
        other => {
            let (series, rank) = other.split_at(1);
            let rank: u32 = rank.parse().ok()?;
            if rank > 10 {
                return None;
            }
            let base_mm = match series {
                "A" => (841.0, 1189.0),
                "B" => (1000.0, 1414.0),
                "C" => (917.0, 1297.0),
                _ => return None,
            };
            let (w, h) = iso_halve(base_mm, rank);
            (w * MM_TO_PT, h * MM_TO_PT)
        }
    };
    Some(named)
}

/// ISO 216: each rank halves the longer side, rounding down to whole
/// millimetres.
fn iso_halve(base: (f64, f64), rank: u32) -> (f64, f64) {
    let (mut w, mut h) = base;
    for _ in 0..rank {
        let half = (h / 2.0).floor();
        h = w;
        w = half;
    }
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_210_by_297_mm() {
        let (w, h) = parse("A4").unwrap();
        assert!((w - 210.0 * MM_TO_PT).abs() < 0.01);
        assert!((h - 297.0 * MM_TO_PT).abs() < 0.01);
    }

    #[test]
    fn landscape_prefix_swaps_axes() {
        let portrait = parse("A4").unwrap();
        let landscape = parse("L-A4").unwrap();
        assert_eq!(landscape, (portrait.1, portrait.0));
    }

    #[test]
    fn named_and_explicit_sizes() {
        assert_eq!(parse("letter"), Some((612.0, 792.0)));
        assert_eq!(parse("595.3,841.9"), Some((595.3, 841.9)));
        assert_eq!(parse("D4"), None);
        assert_eq!(parse("A11"), None);
        assert_eq!(parse("0,100"), None);
    }

    #[test]
    fn b_and_c_series() {
        let (w, _) = parse("B5").unwrap();
        assert!((w - 176.0 * MM_TO_PT).abs() < 0.01);
        let (w, _) = parse("C6").unwrap();
        assert!((w - 114.0 * MM_TO_PT).abs() < 0.01);
    }
}
