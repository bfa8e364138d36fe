//! Generation request and prompt construction

use crate::constants;

/// Everything a provider needs to generate one batch for a category
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub category: String,
    pub item_count: usize,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(category: &str, item_count: usize) -> Self {
        Self {
            category: category.to_string(),
            item_count,
            temperature: constants::generation::TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Prompt text, identical for identical (category, item_count)
    pub fn prompt(&self) -> String {
        format!(
            "Generate {count} multiple-choice questions for the {category} exam.\n\
             Order them by difficulty, starting easy and ending at expert level.\n\
             Return ONLY a JSON array. Each element must be an object with:\n\
             - \"question\": the question text\n\
             - \"options\": an array of exactly 4 answer strings\n\
             - \"correctIndex\": the zero-based index (0-3) of the correct option\n\
             - \"explanation\": one or two sentences on why that option is correct\n\
             - \"topic\": the exam domain the question belongs to",
            count = self.item_count,
            category = self.category,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_deterministic() {
        let a = GenerationRequest::new("AWS Solutions Architect", 10);
        let b = GenerationRequest::new("AWS Solutions Architect", 10);
        assert_eq!(a.prompt(), b.prompt());
        assert!(a.prompt().contains("Generate 10 multiple-choice questions"));
        assert!(a.prompt().contains("AWS Solutions Architect"));
    }

    #[test]
    fn test_prompt_varies_by_category() {
        let a = GenerationRequest::new("CKA", 10);
        let b = GenerationRequest::new("Terraform Associate", 10);
        assert_ne!(a.prompt(), b.prompt());
    }
}
