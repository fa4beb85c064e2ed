use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{ChartTheme, Table};

/// Embedded theme name that requests host-driven theming.
pub const HOST_THEME_NAME: &str = "streamlit";

/// Theme source requested by the element owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeMode {
    /// Full host theme substitution.
    #[serde(rename = "streamlit")]
    Host,
    /// Minimal, non-destructive compatibility defaults.
    #[default]
    #[serde(rename = "default")]
    Default,
}

/// Ordered list of enabled selector names.
pub type SelectionModes = SmallVec<[String; 4]>;

/// Key used to address this element's value in the widget-state store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetRef {
    pub id: String,
    #[serde(default)]
    pub form_id: Option<String>,
}

/// Immutable chart element snapshot supplied by the owner on every render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartElement {
    pub spec: String,
    pub data: Option<Table>,
    pub datasets: IndexMap<String, Table>,
    pub selection_mode: SelectionModes,
    pub id: Option<String>,
    pub form_id: Option<String>,
    pub theme_mode: ThemeMode,
    pub use_container_width: bool,
}

impl ChartElement {
    #[must_use]
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Table) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, data: Table) -> Self {
        self.datasets.insert(name.into(), data);
        self
    }

    #[must_use]
    pub fn with_selection_mode<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection_mode = selectors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = Some(form_id.into());
        self
    }

    #[must_use]
    pub fn with_theme_mode(mut self, theme_mode: ThemeMode) -> Self {
        self.theme_mode = theme_mode;
        self
    }

    #[must_use]
    pub fn with_container_width(mut self, use_container_width: bool) -> Self {
        self.use_container_width = use_container_width;
        self
    }

    /// Store address of this element, available only when it has an id.
    #[must_use]
    pub fn widget_ref(&self) -> Option<WidgetRef> {
        self.id.as_ref().map(|id| WidgetRef {
            id: id.clone(),
            form_id: self.form_id.clone(),
        })
    }
}

/// Host rectangle the rendering view is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRect {
    pub width: u32,
    pub height: Option<u32>,
}

/// Full set of inputs for one render of a chart component.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartProps {
    pub element: ChartElement,
    pub theme: ChartTheme,
    pub width: u32,
    pub height: Option<u32>,
    pub is_full_screen: bool,
    pub fragment_id: Option<String>,
}

impl ChartProps {
    #[must_use]
    pub fn new(element: ChartElement, theme: ChartTheme, width: u32) -> Self {
        Self {
            element,
            theme,
            width,
            height: None,
            is_full_screen: false,
            fragment_id: None,
        }
    }

    #[must_use]
    pub fn with_height(mut self, height: Option<u32>) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_full_screen(mut self, is_full_screen: bool) -> Self {
        self.is_full_screen = is_full_screen;
        self
    }

    #[must_use]
    pub fn with_fragment_id(mut self, fragment_id: impl Into<String>) -> Self {
        self.fragment_id = Some(fragment_id.into());
        self
    }

    #[must_use]
    pub fn container(&self) -> ContainerRect {
        ContainerRect {
            width: self.width,
            height: self.height,
        }
    }
}
