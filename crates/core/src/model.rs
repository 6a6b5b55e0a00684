use serde::{Deserialize, Serialize};

/// Models served by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelName {
    /// Data-only MSE training, no Jacobian guidance
    BaselineNn,
    /// Data + Jacobian matching to the kinetic model
    Pcinn,
    /// Data + Jacobian matching + soft anchor to theory predictions
    #[default]
    SaPcinn,
}

impl ModelName {
    /// Every model, in the order the compare endpoint reports them.
    pub const ALL: [ModelName; 3] = [Self::BaselineNn, Self::Pcinn, Self::SaPcinn];

    /// Wire name used in `?model=` and JSON keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaselineNn => "baseline_nn",
            Self::Pcinn => "pcinn",
            Self::SaPcinn => "sa_pcinn",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::BaselineNn => "Baseline NN",
            Self::Pcinn => "PCINN",
            Self::SaPcinn => "SA-PCINN",
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown model '{}'. Available: baseline_nn, pcinn, sa_pcinn",
                    s.trim()
                )
            })
    }
}

/// Model descriptor from `GET /models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_default: bool,
    pub final_test_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// Liveness descriptor from `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub models_loaded: u32,
    #[serde(default)]
    pub available_models: Vec<String>,
    #[serde(default)]
    pub default_model: String,
    #[serde(default)]
    pub pytorch_version: String,
    #[serde(default)]
    pub fold: u32,
}
