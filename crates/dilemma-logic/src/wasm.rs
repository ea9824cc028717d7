//! WASM bindings for browser display of a running simulation

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{Engine, SimulationConfig, StrategyKind};

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// A simulation owned by the page
#[wasm_bindgen]
pub struct Simulation {
    engine: Engine,
}

#[wasm_bindgen]
impl Simulation {
    /// Build from a JSON `SimulationConfig`.
    ///
    /// Missing fields take their defaults. Without a seed, one is drawn
    /// from `Math.random()`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Simulation, JsError> {
        let mut config: SimulationConfig = serde_json::from_str(config_json)
            .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
        if config.seed.is_none() {
            config.seed = Some((js_sys::Math::random() * u64::MAX as f64) as u64);
        }

        let engine = Engine::new(config).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Simulation { engine })
    }

    /// Run one epoch. Throws if no game could be played.
    pub fn advance_epoch(&mut self) -> Result<(), JsError> {
        self.engine
            .advance_epoch()
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn epoch(&self) -> u64 {
        self.engine.epoch()
    }

    pub fn width(&self) -> u32 {
        self.engine.width()
    }

    pub fn height(&self) -> u32 {
        self.engine.height()
    }

    /// Array of `{id, position, strategy, name, color, abbreviation}`
    pub fn portrayals(&self) -> Result<JsValue, JsError> {
        to_js(&self.engine.portrayals())
    }

    /// Every snapshot recorded so far, oldest first
    pub fn snapshots(&self) -> Result<JsValue, JsError> {
        to_js(&self.engine.snapshots())
    }

    /// Strategy name to agent count
    pub fn population(&self) -> Result<JsValue, JsError> {
        to_js(&self.engine.population_by_name())
    }
}

#[derive(serde::Serialize)]
struct StrategyInfo {
    id: &'static str,
    abbreviation: &'static str,
    color: String,
    description: &'static str,
}

/// All strategies with their display attributes
#[wasm_bindgen]
pub fn strategy_catalog() -> Result<JsValue, JsError> {
    let catalog: Vec<StrategyInfo> = StrategyKind::ALL
        .into_iter()
        .map(|kind| StrategyInfo {
            id: kind.name(),
            abbreviation: kind.abbreviation(),
            color: kind.css_color(),
            description: kind.description(),
        })
        .collect();
    to_js(&catalog)
}
