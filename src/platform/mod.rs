// Platform-specific code module

pub mod sysinfo_source;

// Re-exports para imports limpios
pub use sysinfo_source::SysinfoSource;
