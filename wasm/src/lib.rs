use iqsynth_core::{Compositor, SignalDescriptor, SignalSet};
use wasm_bindgen::prelude::*;

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Browser-side synthesizer holding its own signal set
#[wasm_bindgen]
pub struct WasmSynthesizer {
    sample_rate: f64,
    signals: SignalSet,
}

#[wasm_bindgen]
impl WasmSynthesizer {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> Result<WasmSynthesizer, JsValue> {
        iqsynth_core::validate::validate_sample_rate(sample_rate).map_err(to_js)?;
        Ok(WasmSynthesizer {
            sample_rate,
            signals: SignalSet::new(),
        })
    }

    /// Add one descriptor given as JSON, e.g. `{"type": "cw", "freq_offset_hz": 1e6, "gain_dbm": -10}`
    /// Returns the index of the new signal
    #[wasm_bindgen(js_name = addSignalJson)]
    pub fn add_signal_json(&mut self, json: &str) -> Result<usize, JsValue> {
        let descriptor: SignalDescriptor = serde_json::from_str(json).map_err(to_js)?;
        iqsynth_core::validate::validate_descriptor(&descriptor, self.sample_rate).map_err(to_js)?;
        self.signals.push(descriptor);
        Ok(self.signals.len() - 1)
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }

    #[wasm_bindgen(js_name = signalCount)]
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    #[wasm_bindgen(getter, js_name = sampleRate)]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Render the composite as interleaved I/Q (Float32Array)
    /// A non-positive duration selects the default (one sweep period, else 10 ms)
    pub fn render(&self, duration_s: f64, seed: u64) -> Result<Vec<f32>, JsValue> {
        let duration = if duration_s > 0.0 { Some(duration_s) } else { None };
        Compositor::new(self.sample_rate)
            .with_seed(seed)
            .render(&self.signals, duration)
            .map(|buffer| buffer.to_interleaved())
            .map_err(to_js)
    }

    /// One summary line per descriptor
    #[wasm_bindgen(js_name = describe)]
    pub fn describe(&self) -> js_sys::Array {
        self.signals
            .iter()
            .map(|s| JsValue::from_str(&s.to_string()))
            .collect()
    }
}
