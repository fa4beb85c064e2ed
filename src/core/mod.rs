pub mod element;
pub mod selection;
pub mod table;
pub mod theme;

pub use element::{
    ChartElement, ChartProps, ContainerRect, HOST_THEME_NAME, SelectionModes, ThemeMode,
    WidgetRef,
};
pub use selection::SelectionState;
pub use table::{CellValue, Column, DataRow, Table};
pub use theme::{ChartTheme, ThemeBase};
