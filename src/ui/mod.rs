// UI and formatting module

pub mod system_formatters;

// Re-export commonly used items for cleaner imports
pub use system_formatters::{
    format_bytes, format_rate, format_snapshot, print_snapshot, sparkline, RenderOptions,
};
