//! Tool registry and built-in tools
//!
//! Tools advertise a [`ToolDescriptor`] to the completion service and are
//! invoked through [`ToolRegistry::resolve`] once the model asks for them.

mod registry;
mod schema;
mod weather;

pub use registry::{ToolDescriptor, ToolHandler, ToolRegistry};
pub use schema::validate_arguments;
pub use weather::{WEATHER_CONDITIONS, WeatherTool};
