//! Analysis result shapes and the response schemas requested from the model.
//!
//! The field names here are the wire contract with the model: the JSON
//! schema sent with each request and the serde derives below must agree.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisMode {
    Waste,
    Disease,
}

impl AnalysisMode {
    pub fn title(&self) -> &'static str {
        match self {
            AnalysisMode::Waste => "Waste Classifier",
            AnalysisMode::Disease => "Disease Predictor",
        }
    }

    /// Shown in the progress overlay while the model is working.
    pub fn progress_message(&self) -> &'static str {
        match self {
            AnalysisMode::Waste => "Classifying waste...",
            AnalysisMode::Disease => "Predicting diseases...",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            AnalysisMode::Waste => {
                "Analyze this image of waste. Classify it, and provide detailed information on \
                 recycling, disposal, environmental impact, and health risks according to the \
                 provided JSON schema."
            }
            AnalysisMode::Disease => {
                "Analyze this image of a waste dump or drainage area. Based on the visible \
                 conditions, predict potential diseases that could spread and provide detailed \
                 prevention tips according to the provided JSON schema."
            }
        }
    }

    pub fn response_schema(&self) -> Value {
        match self {
            AnalysisMode::Waste => waste_schema(),
            AnalysisMode::Disease => disease_schema(),
        }
    }

    /// Parse the model's JSON text into the result shape for this mode.
    pub fn parse_result(&self, text: &str) -> Result<AnalysisResult> {
        let result = match self {
            AnalysisMode::Waste => {
                AnalysisResult::Waste(serde_json::from_str::<WasteClassificationResult>(text)?)
            }
            AnalysisMode::Disease => {
                AnalysisResult::Disease(serde_json::from_str::<DiseasePredictionResult>(text)?)
            }
        };
        result.validate()?;
        Ok(result)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteClassificationResult {
    pub waste_type: String,
    pub recycling: Recycling,
    pub reuse: String,
    pub disposal: String,
    pub environmental_impact: String,
    pub health_risks: Vec<HealthRisk>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recycling {
    pub possible: bool,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRisk {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseasePredictionResult {
    pub overall_risk_level: RiskLevel,
    pub predicted_diseases: Vec<PredictedDisease>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(alias = "low", alias = "LOW")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "high", alias = "HIGH")]
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// CSS class selecting the visual treatment for this level.
    pub fn css_class(&self) -> &'static str {
        match self {
            RiskLevel::Low => "risk-low",
            RiskLevel::Medium => "risk-medium",
            RiskLevel::High => "risk-high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedDisease {
    pub name: String,
    pub cause: String,
    pub prevention_tips: Vec<String>,
}

/// Result of one analysis, tagged with the mode that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "UPPERCASE")]
pub enum AnalysisResult {
    Waste(WasteClassificationResult),
    Disease(DiseasePredictionResult),
}

impl AnalysisResult {
    pub fn mode(&self) -> AnalysisMode {
        match self {
            AnalysisResult::Waste(_) => AnalysisMode::Waste,
            AnalysisResult::Disease(_) => AnalysisMode::Disease,
        }
    }

    /// Checks the constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        match self {
            AnalysisResult::Waste(waste) => {
                if waste.waste_type.trim().is_empty() {
                    return Err(AppError::ResponseParseError("wasteType is empty".into()));
                }
            }
            AnalysisResult::Disease(disease) => {
                for (i, entry) in disease.predicted_diseases.iter().enumerate() {
                    if entry.name.trim().is_empty() {
                        return Err(AppError::ResponseParseError(format!(
                            "predictedDiseases[{}].name is empty",
                            i
                        )));
                    }
                    if entry.cause.trim().is_empty() {
                        return Err(AppError::ResponseParseError(format!(
                            "predictedDiseases[{}].cause is empty",
                            i
                        )));
                    }
                    if entry.prevention_tips.is_empty() {
                        return Err(AppError::ResponseParseError(format!(
                            "predictedDiseases[{}].preventionTips is empty",
                            i
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn waste_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "wasteType": {
                "type": "STRING",
                "description": "The classified type of waste (e.g., Plastic, Organic, E-Waste, Paper, Glass, Metal, Wood)."
            },
            "recycling": {
                "type": "OBJECT",
                "properties": {
                    "possible": {
                        "type": "BOOLEAN",
                        "description": "Whether this item is typically recyclable."
                    },
                    "instructions": {
                        "type": "STRING",
                        "description": "Detailed instructions on how to recycle this waste. Provide actionable steps."
                    }
                },
                "required": ["possible", "instructions"]
            },
            "reuse": {
                "type": "STRING",
                "description": "Creative and practical ideas for reusing this type of waste item."
            },
            "disposal": {
                "type": "STRING",
                "description": "Instructions for safe and proper disposal if recycling or reuse is not possible."
            },
            "environmentalImpact": {
                "type": "STRING",
                "description": "A summary of the negative environmental effects of improper disposal of this waste type."
            },
            "healthRisks": {
                "type": "ARRAY",
                "description": "A list of potential diseases or health risks associated with this waste.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {
                            "type": "STRING",
                            "description": "Name of the potential disease or health risk."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "Description of how this waste can cause the health risk."
                        }
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["wasteType", "recycling", "reuse", "disposal", "environmentalImpact", "healthRisks"]
    })
}

fn disease_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallRiskLevel": {
                "type": "STRING",
                "format": "enum",
                "enum": ["Low", "Medium", "High"],
                "description": "An overall assessment of the health risk, categorized as Low, Medium, or High."
            },
            "predictedDiseases": {
                "type": "ARRAY",
                "description": "A list of potential diseases that could spread from the conditions shown.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {
                            "type": "STRING",
                            "description": "The name of the potential disease (e.g., Dengue Fever, Cholera, Typhoid, Malaria)."
                        },
                        "cause": {
                            "type": "STRING",
                            "description": "How the conditions in the image (e.g., stagnant water, pests) can lead to this disease."
                        },
                        "preventionTips": {
                            "type": "ARRAY",
                            "description": "A list of specific, actionable prevention tips for the community and individuals.",
                            "items": { "type": "STRING" }
                        }
                    },
                    "required": ["name", "cause", "preventionTips"]
                }
            }
        },
        "required": ["overallRiskLevel", "predictedDiseases"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLASTIC: &str = r#"{
        "wasteType": "Plastic",
        "recycling": {"possible": true, "instructions": "Rinse and place in recycling bin"},
        "reuse": "Use as a planter",
        "disposal": "N/A",
        "environmentalImpact": "Takes 450 years to decompose",
        "healthRisks": [{"name": "Microplastic ingestion", "description": "Breaks into microplastics"}]
    }"#;

    #[test]
    fn parses_waste_result() {
        let result = AnalysisMode::Waste.parse_result(PLASTIC).unwrap();
        assert_eq!(result.mode(), AnalysisMode::Waste);
        let AnalysisResult::Waste(waste) = result else {
            panic!("expected waste result");
        };
        assert_eq!(waste.waste_type, "Plastic");
        assert!(waste.recycling.possible);
        assert_eq!(waste.health_risks.len(), 1);
        assert_eq!(waste.health_risks[0].name, "Microplastic ingestion");
    }

    #[test]
    fn waste_result_missing_field_is_rejected() {
        let text = r#"{"wasteType": "Glass", "reuse": "", "disposal": "", "environmentalImpact": "", "healthRisks": []}"#;
        let err = AnalysisMode::Waste.parse_result(text).unwrap_err();
        assert!(matches!(err, AppError::ResponseParseError(_)));
    }

    #[test]
    fn null_field_is_rejected() {
        let text = PLASTIC.replace(r#""Use as a planter""#, "null");
        let err = AnalysisMode::Waste.parse_result(&text).unwrap_err();
        assert!(matches!(err, AppError::ResponseParseError(_)));
    }

    #[test]
    fn parses_disease_result_with_lowercase_risk() {
        let text = r#"{
            "overallRiskLevel": "high",
            "predictedDiseases": [{
                "name": "Cholera",
                "cause": "Contaminated stagnant water",
                "preventionTips": ["Boil water", "Avoid contact with standing water"]
            }]
        }"#;
        let AnalysisResult::Disease(disease) = AnalysisMode::Disease.parse_result(text).unwrap()
        else {
            panic!("expected disease result");
        };
        assert_eq!(disease.overall_risk_level, RiskLevel::High);
        assert_eq!(disease.overall_risk_level.css_class(), "risk-high");
        assert_eq!(disease.predicted_diseases[0].prevention_tips.len(), 2);
    }

    #[test]
    fn unknown_risk_level_is_rejected() {
        let text = r#"{"overallRiskLevel": "Severe", "predictedDiseases": []}"#;
        assert!(AnalysisMode::Disease.parse_result(text).is_err());
    }

    #[test]
    fn disease_without_tips_fails_validation() {
        let text = r#"{
            "overallRiskLevel": "Medium",
            "predictedDiseases": [{"name": "Dengue", "cause": "Mosquitoes", "preventionTips": []}]
        }"#;
        let err = AnalysisMode::Disease.parse_result(text).unwrap_err();
        assert!(err.to_string().contains("preventionTips"));
    }

    #[test]
    fn waste_json_does_not_parse_as_disease() {
        assert!(AnalysisMode::Disease.parse_result(PLASTIC).is_err());
    }

    #[test]
    fn schemas_require_every_top_level_field() {
        let schema = AnalysisMode::Waste.response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(
            required,
            ["wasteType", "recycling", "reuse", "disposal", "environmentalImpact", "healthRisks"]
        );
        let disease = AnalysisMode::Disease.response_schema();
        assert_eq!(
            disease["properties"]["predictedDiseases"]["items"]["required"],
            json!(["name", "cause", "preventionTips"])
        );
    }

    #[test]
    fn mode_wire_names() {
        assert_eq!(serde_json::to_string(&AnalysisMode::Waste).unwrap(), "\"WASTE\"");
        let mode: AnalysisMode = serde_json::from_str("\"DISEASE\"").unwrap();
        assert_eq!(mode, AnalysisMode::Disease);
    }
}
