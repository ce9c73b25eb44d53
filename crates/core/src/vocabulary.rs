use crate::error::NormalizeError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const VOCABULARY_VERSION: u32 = 1;

/// Reported count field a vocabulary term contributes to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeywordField {
    ArtificialIntelligence,
    MachineLearning,
    NeuralNetwork,
    DeepLearning,
    Automated,
    Deepfake,
    SyntheticMedia,
    LargeLanguageModel,
    FoundationModel,
    Chatbot,
    RecommendationSystem,
    Algorithm,
    AutonomousVehicle,
}

const STANDARD_TERMS: [(&str, KeywordField); 14] = [
    ("artificial intelligence", KeywordField::ArtificialIntelligence),
    ("machine learning", KeywordField::MachineLearning),
    ("neural network", KeywordField::NeuralNetwork),
    ("deep learning", KeywordField::DeepLearning),
    ("automated", KeywordField::Automated),
    ("deepfake", KeywordField::Deepfake),
    ("deep fake", KeywordField::Deepfake),
    ("synthetic media", KeywordField::SyntheticMedia),
    ("large language model", KeywordField::LargeLanguageModel),
    ("foundation model", KeywordField::FoundationModel),
    ("chatbot", KeywordField::Chatbot),
    ("recommendation system", KeywordField::RecommendationSystem),
    ("autonomous vehicle", KeywordField::AutonomousVehicle),
    ("algorithm", KeywordField::Algorithm),
];

#[derive(Debug, Clone)]
pub struct KeywordTerm {
    pub phrase: String,
    pub field: KeywordField,
    pattern: Regex,
}

impl KeywordTerm {
    pub fn new(phrase: impl Into<String>, field: KeywordField) -> Result<Self, NormalizeError> {
        let phrase = phrase.into();
        if phrase.trim().is_empty() {
            return Err(NormalizeError::InvalidArgument(
                "keyword phrase is empty".to_string(),
            ));
        }

        let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&phrase)))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            phrase,
            field,
            pattern,
        })
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// Ordered keyword list shared by every component that scans text.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    version: u32,
    terms: Vec<KeywordTerm>,
}

impl Vocabulary {
    pub fn new(version: u32, terms: Vec<KeywordTerm>) -> Self {
        Self { version, terms }
    }

    pub fn standard() -> Result<Self, NormalizeError> {
        let terms = STANDARD_TERMS
            .iter()
            .map(|(phrase, field)| KeywordTerm::new(*phrase, *field))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(VOCABULARY_VERSION, terms))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn terms(&self) -> &[KeywordTerm] {
        &self.terms
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|term| term.phrase.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordCounts {
    #[serde(rename = "keyword_artificial_intelligence")]
    pub artificial_intelligence: u32,
    #[serde(rename = "keyword_machine_learning")]
    pub machine_learning: u32,
    #[serde(rename = "keyword_neural_network")]
    pub neural_network: u32,
    #[serde(rename = "keyword_deep_learning")]
    pub deep_learning: u32,
    #[serde(rename = "keyword_automated")]
    pub automated: u32,
    #[serde(rename = "keyword_deepfake")]
    pub deepfake: u32,
    #[serde(rename = "keyword_synthetic_media")]
    pub synthetic_media: u32,
    #[serde(rename = "keyword_large_language_model")]
    pub large_language_model: u32,
    #[serde(rename = "keyword_foundation_model")]
    pub foundation_model: u32,
    #[serde(rename = "keyword_chatbot")]
    pub chatbot: u32,
    #[serde(rename = "keyword_recommendation_system")]
    pub recommendation_system: u32,
    #[serde(rename = "keyword_algorithm")]
    pub algorithm: u32,
    #[serde(rename = "keyword_autonomous_vehicle")]
    pub autonomous_vehicle: u32,
}

impl KeywordCounts {
    pub fn add(&mut self, field: KeywordField, count: u32) {
        let slot = match field {
            KeywordField::ArtificialIntelligence => &mut self.artificial_intelligence,
            KeywordField::MachineLearning => &mut self.machine_learning,
            KeywordField::NeuralNetwork => &mut self.neural_network,
            KeywordField::DeepLearning => &mut self.deep_learning,
            KeywordField::Automated => &mut self.automated,
            KeywordField::Deepfake => &mut self.deepfake,
            KeywordField::SyntheticMedia => &mut self.synthetic_media,
            KeywordField::LargeLanguageModel => &mut self.large_language_model,
            KeywordField::FoundationModel => &mut self.foundation_model,
            KeywordField::Chatbot => &mut self.chatbot,
            KeywordField::RecommendationSystem => &mut self.recommendation_system,
            KeywordField::Algorithm => &mut self.algorithm,
            KeywordField::AutonomousVehicle => &mut self.autonomous_vehicle,
        };
        *slot = slot.saturating_add(count);
    }

    pub fn get(&self, field: KeywordField) -> u32 {
        match field {
            KeywordField::ArtificialIntelligence => self.artificial_intelligence,
            KeywordField::MachineLearning => self.machine_learning,
            KeywordField::NeuralNetwork => self.neural_network,
            KeywordField::DeepLearning => self.deep_learning,
            KeywordField::Automated => self.automated,
            KeywordField::Deepfake => self.deepfake,
            KeywordField::SyntheticMedia => self.synthetic_media,
            KeywordField::LargeLanguageModel => self.large_language_model,
            KeywordField::FoundationModel => self.foundation_model,
            KeywordField::Chatbot => self.chatbot,
            KeywordField::RecommendationSystem => self.recommendation_system,
            KeywordField::Algorithm => self.algorithm,
            KeywordField::AutonomousVehicle => self.autonomous_vehicle,
        }
    }

    pub fn sum(&self) -> u32 {
        [
            self.artificial_intelligence,
            self.machine_learning,
            self.neural_network,
            self.deep_learning,
            self.automated,
            self.deepfake,
            self.synthetic_media,
            self.large_language_model,
            self.foundation_model,
            self.chatbot,
            self.recommendation_system,
            self.algorithm,
            self.autonomous_vehicle,
        ]
        .iter()
        .sum()
    }
}
