use serde::{Deserialize, Serialize};

/// Logical model ids accepted by the generation endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ModelId {
    #[serde(rename = "flux-pro")]
    FluxPro,
    #[serde(rename = "flux-dev")]
    FluxDev,
    #[serde(rename = "flux-schnell")]
    FluxSchnell,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::FluxPro, ModelId::FluxDev, ModelId::FluxSchnell];

    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "flux-pro" => Some(ModelId::FluxPro),
            "flux-dev" => Some(ModelId::FluxDev),
            "flux-schnell" => Some(ModelId::FluxSchnell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::FluxPro => "flux-pro",
            ModelId::FluxDev => "flux-dev",
            ModelId::FluxSchnell => "flux-schnell",
        }
    }

    /// Provider route the model is served from.
    pub fn route(&self) -> &'static str {
        match self {
            ModelId::FluxPro => "fal-ai/flux-pro",
            ModelId::FluxDev => "fal-ai/flux/dev",
            ModelId::FluxSchnell => "fal-ai/flux-schnell",
        }
    }

    pub fn info(&self) -> ModelInfo {
        let (name, tags): (&str, &[&str]) = match self {
            ModelId::FluxPro => ("FLUX.1 Pro", &["quality", "photoreal"]),
            ModelId::FluxDev => ("FLUX.1 Dev", &["balanced", "general"]),
            ModelId::FluxSchnell => ("FLUX.1 Schnell", &["fast", "iterative"]),
        };

        ModelInfo {
            id: *self,
            name: name.to_string(),
            route: self.route().to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

impl Default for ModelId {
    fn default() -> Self {
        ModelId::FluxPro
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub id: ModelId,
    pub name: String,
    pub route: String,
    pub tags: Vec<String>,
}

/// Width:height ratio labels offered by the composer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Widescreen,
    ];

    /// (width-ratio, height-ratio)
    pub fn ratio(&self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1, 1),
            AspectRatio::Portrait => (3, 4),
            AspectRatio::Landscape => (4, 3),
            AspectRatio::Widescreen => (16, 9),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Widescreen => "16:9",
        }
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio::Square
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const STYLE_PRESETS: [&str; 8] = [
    "Cinematic",
    "Analog film",
    "Neon noir",
    "Watercolor",
    "Studio lighting",
    "Isometric",
    "3D render",
    "Fantasy art",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleCatalog {
    pub styles: Vec<String>,
}

impl ModelCatalog {
    pub fn supported() -> Self {
        ModelCatalog {
            models: ModelId::ALL.iter().map(ModelId::info).collect(),
        }
    }
}

impl StyleCatalog {
    pub fn presets() -> Self {
        StyleCatalog {
            styles: STYLE_PRESETS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_routes() {
        assert_eq!(ModelId::parse("flux-pro").map(|m| m.route()), Some("fal-ai/flux-pro"));
        assert_eq!(ModelId::parse("flux-dev").map(|m| m.route()), Some("fal-ai/flux/dev"));
        assert_eq!(
            ModelId::parse("flux-schnell").map(|m| m.route()),
            Some("fal-ai/flux-schnell")
        );
        assert_eq!(ModelId::parse("unknown-model"), None);
    }

    #[test]
    fn test_aspect_wire_names() {
        let aspect: AspectRatio = serde_json::from_str("\"16:9\"").unwrap();
        assert_eq!(aspect, AspectRatio::Widescreen);
        assert_eq!(serde_json::to_string(&AspectRatio::Portrait).unwrap(), "\"3:4\"");
        assert!(serde_json::from_str::<AspectRatio>("\"2:1\"").is_err());
    }

    #[test]
    fn test_catalog_serialization() {
        let value = serde_json::to_value(ModelCatalog::supported()).unwrap();
        assert_eq!(value["models"][0]["id"], "flux-pro");
        assert_eq!(value["models"][2]["name"], "FLUX.1 Schnell");
        assert_eq!(StyleCatalog::presets().styles.len(), 8);
    }
}
