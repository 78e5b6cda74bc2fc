use serde::{Deserialize, Serialize};

use crate::grouping::ColorStrategy;

/// Appearance and update behaviour of one draw call.
///
/// Missing fields deserialize to their defaults, so callers only spell out
/// what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawOptions {
    /// Point radius
    pub size: f32,
    pub colours: Vec<String>,
    pub colour_strategy: ColorStrategy,
    pub opacity: f32,
    /// Allow in-place buffer updates when redrawn with the same element count
    pub updatable: bool,
    pub hidden: bool,

    pub draw_faces: bool,
    pub draw_edges: bool,
    pub draw_vertices: bool,
    pub face_colour: String,
    pub face_opacity: f32,
    pub edge_colour: String,
    /// Width of mesh edges and of line-like entities
    pub edge_width: f32,
    pub vertex_colour: String,
    pub vertex_size: f32,
    pub draw_two_sided: bool,
    pub back_face_colour: String,
    pub back_face_opacity: f32,

    pub z_offset: f32,
    /// Samples per curve span and per surface direction
    pub tessellation_segments: u32,
    pub tag_size: f32,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            size: 0.1,
            colours: vec!["#ff0000".to_string()],
            colour_strategy: ColorStrategy::default(),
            opacity: 1.0,
            updatable: false,
            hidden: false,
            draw_faces: true,
            draw_edges: true,
            draw_vertices: false,
            face_colour: "#ff0000".to_string(),
            face_opacity: 1.0,
            edge_colour: "#ffffff".to_string(),
            edge_width: 2.0,
            vertex_colour: "#ffaaff".to_string(),
            vertex_size: 0.03,
            draw_two_sided: true,
            back_face_colour: "#0000ff".to_string(),
            back_face_opacity: 1.0,
            z_offset: 0.0,
            tessellation_segments: 32,
            tag_size: 0.3,
        }
    }
}

impl DrawOptions {
    pub fn updatable() -> Self {
        Self {
            updatable: true,
            ..Self::default()
        }
    }

    pub fn with_colours<I, S>(mut self, colours: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colours = colours.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strategy(mut self, strategy: ColorStrategy) -> Self {
        self.colour_strategy = strategy;
        self
    }

    /// First configured colour, for entities drawn in a single colour
    pub fn primary_colour(&self) -> &str {
        self.colours
            .first()
            .map(String::as_str)
            .unwrap_or(crate::material::DEFAULT_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: DrawOptions =
            serde_json::from_str(r##"{"updatable": true, "colours": ["#00ff00"], "colourStrategy": "repeatColors"}"##)
                .unwrap();
        assert!(opts.updatable);
        assert_eq!(opts.colour_strategy, ColorStrategy::RepeatColors);
        assert_eq!(opts.opacity, 1.0);
        assert!(opts.draw_two_sided);
    }

    #[test]
    fn test_primary_colour_fallback() {
        let opts = DrawOptions::default().with_colours(Vec::<String>::new());
        assert_eq!(opts.primary_colour(), "#ff0000");
    }
}
