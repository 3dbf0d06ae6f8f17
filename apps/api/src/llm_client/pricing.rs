//! Token pricing: converts usage counts into an estimated USD cost.

/// Per-million-token rates for one model. Fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Pricing {
    /// Gemini Flash list pricing.
    pub const GEMINI_FLASH: Pricing = Pricing {
        input_per_million: 0.075,
        output_per_million: 0.30,
    };

    /// Estimated cost in USD for a single call.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (f64::from(input_tokens) / 1_000_000.0) * self.input_per_million
            + (f64::from(output_tokens) / 1_000_000.0) * self.output_per_million
    }
}

impl Default for Pricing {
    fn default() -> Self {
        Self::GEMINI_FLASH
    }
}
