//! Named parameter bundles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{ColorMode, EdgeMode, ParseError, PixelationOptions};

/// Identifier of a built-in preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetId {
    /// 8-bit game sprites.
    Game,
    /// Classic arcade look.
    Arcade,
    /// Profile pictures.
    Avatar,
    /// Blocky textures.
    Minecraft,
    /// Soft mosaic tiles.
    Mosaic,
    /// Sepia photo effect.
    Vintage,
}

impl PresetId {
    /// All presets in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Game,
        Self::Arcade,
        Self::Avatar,
        Self::Minecraft,
        Self::Mosaic,
        Self::Vintage,
    ];

    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Arcade => "arcade",
            Self::Avatar => "avatar",
            Self::Minecraft => "minecraft",
            Self::Mosaic => "mosaic",
            Self::Vintage => "vintage",
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::new("preset", s))
    }
}

/// Grouping used by preset pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Game-oriented presets with the retro palette and hard edges.
    Gaming,
    /// Photo-oriented presets with soft edges.
    Artistic,
}

impl Category {
    /// Both categories in display order.
    pub const ALL: [Self; 2] = [Self::Gaming, Self::Artistic];

    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gaming => "gaming",
            Self::Artistic => "artistic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static, named set of pixelation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Identifier.
    pub id: PresetId,
    /// Human-readable name.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Block size.
    pub pixel_size: u32,
    /// Color transform.
    pub color_mode: ColorMode,
    /// Edge treatment.
    pub edge_mode: EdgeMode,
    /// Picker grouping.
    pub category: Category,
}

impl Preset {
    /// The pixelation options this preset selects.
    #[must_use]
    pub const fn options(&self) -> PixelationOptions {
        PixelationOptions::new(self.pixel_size, self.color_mode, self.edge_mode)
    }

    /// Whether `options` select exactly this preset's parameters.
    #[must_use]
    pub fn matches(&self, options: &PixelationOptions) -> bool {
        self.options() == *options
    }
}

/// The built-in catalog.
pub const PRESETS: [Preset; 6] = [
    Preset {
        id: PresetId::Game,
        display_name: "8-bit Game",
        description: "Perfect for creating game sprites and retro artwork",
        pixel_size: 12,
        color_mode: ColorMode::Retro,
        edge_mode: EdgeMode::Hard,
        category: Category::Gaming,
    },
    Preset {
        id: PresetId::Arcade,
        display_name: "Arcade",
        description: "Classic arcade game style with small pixels",
        pixel_size: 8,
        color_mode: ColorMode::Retro,
        edge_mode: EdgeMode::Hard,
        category: Category::Gaming,
    },
    Preset {
        id: PresetId::Avatar,
        display_name: "Avatar",
        description: "Great for profile pictures and portraits",
        pixel_size: 6,
        color_mode: ColorMode::Original,
        edge_mode: EdgeMode::Soft,
        category: Category::Artistic,
    },
    Preset {
        id: PresetId::Minecraft,
        display_name: "Minecraft",
        description: "Block-style textures",
        pixel_size: 16,
        color_mode: ColorMode::Retro,
        edge_mode: EdgeMode::Hard,
        category: Category::Gaming,
    },
    Preset {
        id: PresetId::Mosaic,
        display_name: "Mosaic",
        description: "Mosaic-style artwork with soft edges",
        pixel_size: 4,
        color_mode: ColorMode::Original,
        edge_mode: EdgeMode::Soft,
        category: Category::Artistic,
    },
    Preset {
        id: PresetId::Vintage,
        display_name: "Vintage",
        description: "Retro photo effect with sepia tones",
        pixel_size: 10,
        color_mode: ColorMode::Sepia,
        edge_mode: EdgeMode::Soft,
        category: Category::Artistic,
    },
];

/// Look up a preset by id.
#[must_use]
pub fn preset(id: PresetId) -> &'static Preset {
    // `PRESETS` is ordered like the `PresetId` variants.
    &PRESETS[id as usize]
}

/// The first preset whose parameters equal `options`, if any.
#[must_use]
pub fn find_matching(options: &PixelationOptions) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.matches(options))
}

/// Presets in `category`, in catalog order.
pub fn by_category(category: Category) -> impl Iterator<Item = &'static Preset> {
    PRESETS.iter().filter(move |p| p.category == category)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_id_has_a_catalog_entry() {
        for id in PresetId::ALL {
            assert_eq!(preset(id).id, id);
        }
        assert_eq!(PRESETS.len(), PresetId::ALL.len());
    }

    #[test]
    fn catalog_values() {
        let game = preset(PresetId::Game).options();
        assert_eq!(
            game,
            PixelationOptions::new(12, ColorMode::Retro, EdgeMode::Hard)
        );
        let avatar = preset(PresetId::Avatar);
        assert_eq!(avatar.pixel_size, 6);
        assert_eq!(avatar.edge_mode, EdgeMode::Soft);
        let mosaic = preset(PresetId::Mosaic);
        assert_eq!(mosaic.pixel_size, 4);
        let vintage = preset(PresetId::Vintage);
        assert_eq!(vintage.color_mode, ColorMode::Sepia);
        assert_eq!(vintage.edge_mode, EdgeMode::Soft);
    }

    #[test]
    fn parse_ids_case_insensitively() {
        assert_eq!("minecraft".parse::<PresetId>().unwrap(), PresetId::Minecraft);
        assert_eq!(" Vintage ".parse::<PresetId>().unwrap(), PresetId::Vintage);
        assert!("pixel".parse::<PresetId>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for id in PresetId::ALL {
            assert_eq!(id.to_string().parse::<PresetId>().unwrap(), id);
        }
    }

    #[test]
    fn find_matching_recognizes_preset_options() {
        for p in &PRESETS {
            assert_eq!(find_matching(&p.options()).unwrap().id, p.id);
        }
        let custom = PixelationOptions::new(13, ColorMode::Vibrant, EdgeMode::Soft);
        assert!(find_matching(&custom).is_none());
    }

    #[test]
    fn categories_partition_the_catalog() {
        let gaming: Vec<PresetId> = by_category(Category::Gaming).map(|p| p.id).collect();
        let artistic: Vec<PresetId> = by_category(Category::Artistic).map(|p| p.id).collect();
        assert_eq!(
            gaming,
            vec![PresetId::Game, PresetId::Arcade, PresetId::Minecraft]
        );
        assert_eq!(
            artistic,
            vec![PresetId::Avatar, PresetId::Mosaic, PresetId::Vintage]
        );
    }

    #[test]
    fn preset_options_pass_validation() {
        for p in &PRESETS {
            assert!(p.options().validate().is_ok());
            assert_eq!(p.options(), p.options().clamped());
        }
    }

    #[test]
    fn preset_serializes_to_camel_case() {
        let json = serde_json::to_value(preset(PresetId::Arcade)).unwrap();
        assert_eq!(json["id"], "arcade");
        assert_eq!(json["pixelSize"], 8);
        assert_eq!(json["colorMode"], "retro");
        assert_eq!(json["category"], "gaming");
    }
}
