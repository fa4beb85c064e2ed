use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeBase {
    #[default]
    Light,
    Dark,
}

/// Host theme values consumed by the theming collaborator.
///
/// Two themes are equal only when every field matches; any difference
/// forces a full view recreation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    pub base: ThemeBase,
    pub background_color: String,
    pub text_color: String,
    pub grid_color: String,
    pub body_font: String,
    pub label_font_size_px: u32,
    pub title_font_size_px: u32,
    pub categorical_colors: Vec<String>,
    pub sequential_colors: Vec<String>,
    pub diverging_colors: Vec<String>,
}

const BODY_FONT: &str = "\"Source Sans Pro\", sans-serif";

const DIVERGING_COLORS: [&str; 10] = [
    "#7d353b", "#bd4043", "#ff4b4b", "#ff8c8c", "#ffc7c7", "#a6dcff", "#60b4ff", "#1c83e1",
    "#0054a3", "#004280",
];

const SEQUENTIAL_COLORS: [&str; 10] = [
    "#e4f5ff", "#c7ebff", "#a6dcff", "#83c9ff", "#60b4ff", "#3d9df3", "#1c83e1", "#0068c9",
    "#0054a3", "#004280",
];

fn owned(colors: &[&str]) -> Vec<String> {
    colors.iter().map(|color| (*color).to_owned()).collect()
}

impl ChartTheme {
    #[must_use]
    pub fn light() -> Self {
        Self {
            base: ThemeBase::Light,
            background_color: "#ffffff".to_owned(),
            text_color: "#31333f".to_owned(),
            grid_color: "#e6eaf1".to_owned(),
            body_font: BODY_FONT.to_owned(),
            label_font_size_px: 12,
            title_font_size_px: 16,
            categorical_colors: owned(&[
                "#0068c9", "#83c9ff", "#ff2b2b", "#ffabab", "#29b09d", "#7defa1", "#ff8700",
                "#ffd16a", "#6d3fc0", "#d5dae5",
            ]),
            sequential_colors: owned(&SEQUENTIAL_COLORS),
            diverging_colors: owned(&DIVERGING_COLORS),
        }
    }

    #[must_use]
    pub fn dark() -> Self {
        let mut sequential = owned(&SEQUENTIAL_COLORS);
        sequential.reverse();
        Self {
            base: ThemeBase::Dark,
            background_color: "#0e1117".to_owned(),
            text_color: "#fafafa".to_owned(),
            grid_color: "#31333f".to_owned(),
            body_font: BODY_FONT.to_owned(),
            label_font_size_px: 12,
            title_font_size_px: 16,
            categorical_colors: owned(&[
                "#83c9ff", "#0068c9", "#ffabab", "#ff2b2b", "#7defa1", "#29b09d", "#ffd16a",
                "#ff8700", "#6d3fc0", "#d5dae5",
            ]),
            sequential_colors: sequential,
            diverging_colors: owned(&DIVERGING_COLORS),
        }
    }
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self::light()
    }
}
