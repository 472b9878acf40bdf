//! `get_weather` tool
//!
//! Reports a random condition for the requested city. The randomness is the
//! tool's declared behavior; results are neither cached nor retried.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::{Map, Value, json};

use super::registry::{ToolDescriptor, ToolHandler};
use crate::{Error, Result};

/// Conditions the tool can report
pub const WEATHER_CONDITIONS: [&str; 4] = ["sunny", "cloudy", "rainy", "snowy"];

/// Mock weather lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct WeatherTool;

impl WeatherTool {
    pub const NAME: &'static str = "get_weather";

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: Self::NAME.to_string(),
            description: "Get the weather for a given city".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city"
                    }
                },
                "required": ["city"]
            }),
        }
    }

    /// Sentence reported back to the model
    #[must_use]
    pub fn report(city: &str, condition: &str) -> String {
        format!("The weather in {city} is {condition}.")
    }
}

#[async_trait]
impl ToolHandler for WeatherTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<String> {
        let city = arguments
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ToolExecution {
                tool: Self::NAME.to_string(),
                reason: "city must be a string".to_string(),
            })?;

        let condition = WEATHER_CONDITIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("sunny");

        tracing::debug!(city, condition, "get_weather called");
        Ok(Self::report(city, condition))
    }
}
