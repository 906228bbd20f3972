use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryColor {
    pub slug: String,
    pub primary: &'static str,
    pub gradient: &'static str,
    pub glow: &'static str,
}

struct Palette {
    slug: &'static str,
    primary: &'static str,
    gradient: &'static str,
    glow: &'static str,
}

const PALETTE: &[Palette] = &[
    Palette {
        slug: "java",
        primary: "#00d4ff",
        gradient: "rgba(0, 212, 255, 0.2)",
        glow: "rgba(0, 212, 255, 0.4)",
    },
    Palette {
        slug: "python",
        primary: "#ffd700",
        gradient: "rgba(255, 215, 0, 0.2)",
        glow: "rgba(255, 215, 0, 0.4)",
    },
    Palette {
        slug: "devops",
        primary: "#ff6b35",
        gradient: "rgba(255, 107, 53, 0.2)",
        glow: "rgba(255, 107, 53, 0.4)",
    },
    Palette {
        slug: "data",
        primary: "#a855f7",
        gradient: "rgba(168, 85, 247, 0.2)",
        glow: "rgba(168, 85, 247, 0.4)",
    },
    Palette {
        slug: "ai",
        primary: "#00ff88",
        gradient: "rgba(0, 255, 136, 0.2)",
        glow: "rgba(0, 255, 136, 0.4)",
    },
    Palette {
        slug: "testing",
        primary: "#ff3366",
        gradient: "rgba(255, 51, 102, 0.2)",
        glow: "rgba(255, 51, 102, 0.4)",
    },
];

const NEUTRAL: Palette = Palette {
    slug: "",
    primary: "#9e9e9e",
    gradient: "rgba(158, 158, 158, 0.2)",
    glow: "rgba(158, 158, 158, 0.4)",
};

/// Color triple for a category; unknown slugs get neutral gray.
pub fn resolve_color(slug: &str) -> CategoryColor {
    let palette = PALETTE.iter().find(|p| p.slug == slug).unwrap_or(&NEUTRAL);
    CategoryColor {
        slug: slug.to_string(),
        primary: palette.primary,
        gradient: palette.gradient,
        glow: palette.glow,
    }
}

pub fn known_slugs() -> impl Iterator<Item = &'static str> {
    PALETTE.iter().map(|p| p.slug)
}

impl CategoryColor {
    pub fn primary_rgb(&self) -> (u8, u8, u8) {
        parse_hex(self.primary).unwrap_or((158, 158, 158))
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
