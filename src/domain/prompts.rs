//! Prompt templates for note generation
//!
//! Each generation step sends a system prompt plus a user prompt with the
//! `{content}` placeholder replaced by the note's raw content.

/// Default prompt templates for each generation step
pub struct PromptTemplates;

impl PromptTemplates {
    pub fn key_points_system() -> &'static str {
        "You are an expert note-taking assistant. Extract key points from transcribed content and return them as a JSON array of strings."
    }

    /// Get default prompt for key points extraction
    pub fn key_points() -> &'static str {
        r#"Please analyze the following transcribed content and extract the key points as a JSON array of strings.
Each key point should be concise (1-2 sentences) and capture the main ideas.

Content: {content}

Return only a valid JSON array of strings, no additional text."#
    }

    pub fn detailed_notes_system() -> &'static str {
        "You are an expert note-taking assistant. Structure and organize transcribed content into clear, detailed notes."
    }

    /// Get default prompt for detailed notes generation
    pub fn detailed_notes() -> &'static str {
        r#"Please organize and structure the following transcribed content into detailed, well-formatted notes.
Make the content more readable, add proper structure with headings and bullet points where appropriate,
and ensure the information flows logically.

Content: {content}

Return well-structured notes in markdown format."#
    }

    /// Fill the `{content}` placeholder of a template
    pub fn render(template: &str, content: &str) -> String {
        template.replace("{content}", content)
    }
}
