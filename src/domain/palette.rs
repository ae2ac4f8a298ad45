use image::Rgb;

/// Display colour for categories the table does not know.
pub const DEFAULT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const CATEGORY_COLORS: &[(&str, Rgb<u8>)] = &[
    ("plastic", Rgb([255, 255, 0])),   // yellow
    ("paper", Rgb([255, 255, 255])),   // white
    ("metal", Rgb([192, 192, 192])),   // silver
    ("glass", Rgb([255, 0, 255])),     // magenta
    ("organic", Rgb([0, 255, 0])),     // green
    ("cardboard", Rgb([139, 69, 19])), // brown
];

/// Fixed category→colour table plus an explicit fallback.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<(String, Rgb<u8>)>,
    default: Rgb<u8>,
}

impl Palette {
    pub fn new(entries: impl IntoIterator<Item = (String, Rgb<u8>)>, default: Rgb<u8>) -> Self {
        Self {
            entries: entries.into_iter().map(|(k, c)| (k.to_lowercase(), c)).collect(),
            default,
        }
    }

    /// Case-insensitive lookup.
    pub fn color_for(&self, category: &str) -> Rgb<u8> {
        let key = category.to_lowercase();
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, c)| *c)
            .unwrap_or(self.default)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(
            CATEGORY_COLORS.iter().map(|(k, c)| (k.to_string(), *c)),
            DEFAULT_COLOR,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let p = Palette::default();
        assert_eq!(p.color_for("Plastic"), Rgb([255, 255, 0]));
        assert_eq!(p.color_for("CARDBOARD"), Rgb([139, 69, 19]));
    }

    #[test]
    fn unknown_category_falls_back() {
        let p = Palette::default();
        assert_eq!(p.color_for("battery"), DEFAULT_COLOR);
        assert_eq!(p.color_for(""), DEFAULT_COLOR);
    }
}
