use crate::core::models::{ConceptInput, ConceptMatch};

pub const EVOLUTION_SYSTEM_PROMPT: &str =
    "You are an evolutionary analysis system that identifies how ideas evolve and connect. \
     Always respond with valid JSON.";

pub const RANKING_SYSTEM_PROMPT: &str =
    "You are a precise ranking system that evaluates semantic relationships between ideas. \
     Always respond with valid JSON.";

pub const COMPARE_SYSTEM_PROMPT: &str = r#"Compare a new idea against an existing idea.

Decide which applies:
- "new": the new idea is more novel and stands on its own
- "extend": the new idea extends or refines the existing idea
- "equal": the two ideas describe the same thing

Example:
New Idea:
Small context note taking app connected to a knowledge graph using images of handwritten text.

Existing Idea:
An app connected to a knowledge graph to record what I write.

Reply: {"status": "extend"}

Always respond with valid JSON of the form {"status": "new|extend|equal"}."#;

pub const MERGE_SYSTEM_PROMPT: &str = r#"You are an assistant helping a user maintain an accurate and detailed knowledge graph of their ideas.
Your job is to merge two ideas - keeping all original information intact and not hallucinating or inferring beyond what is written.

Generate a single, combined version of the two ideas. You must:
- Preserve all meaningful information from both the new and existing idea.
- Not invent, assume, or compress ideas beyond what is written.
- Create a clear, merged title and description that unifies both without losing meaning.
- Include optional notes if any distinctions between the two should be preserved.

Always respond with valid JSON of the form {"name": "...", "description": "...", "notes": "..." or null}."#;

pub fn build_evolution_prompt(new: &ConceptInput, matches: &[ConceptMatch]) -> String {
    let existing = matches
        .iter()
        .map(|m| format!("- {} (v{}): {}", m.name, m.version, m.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze how this new idea might have evolved from existing ideas in the knowledge graph.
Consider:
1. Which existing ideas might have influenced this new idea
2. What type of evolution occurred (variation, combination, refinement, or branch)
3. How confident you are in this analysis
4. Why this evolution makes sense

New Idea:
{}: {}
Context: {}

Existing Ideas:
{}

Respond with JSON:
{{
  "parent_versions": [{{"name": "...", "version": 1}}],
  "evolution_type": "variation|combination|refinement|branch",
  "confidence": 0.0-1.0,
  "explanation": "why this evolution makes sense"
}}

Only name parents from the existing ideas listed above. If nothing
influenced the new idea, use an empty parent list and "branch"."#,
        new.name,
        new.description,
        new.context.as_deref().unwrap_or("none"),
        existing
    )
}

pub fn build_ranking_prompt(query: &ConceptInput, matches: &[ConceptMatch]) -> String {
    let existing = matches
        .iter()
        .map(|m| format!("- {}: {}", m.name, m.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Given a new idea and a list of existing ideas, analyze how closely they match.
Consider both semantic meaning and specific details.

New Idea:
{}: {}

Existing Ideas:
{}

For each existing idea, provide:
1. A relevance score (0-1) - how closely it matches the new idea
2. A brief explanation of why it is relevant or not

Respond with JSON:
{{"rankings": {{"<idea name>": {{"relevance": 0.0-1.0, "explanation": "..."}}}}}}"#,
        query.name, query.description, existing
    )
}

pub fn build_pair_prompt(new: &ConceptInput, existing: &ConceptMatch) -> String {
    format!(
        "New Idea:\n{}: {}\n\nExisting Idea:\n{}: {}",
        new.name, new.description, existing.name, existing.description
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn a_match(name: &str) -> ConceptMatch {
        ConceptMatch {
            name: name.to_string(),
            description: "desc".to_string(),
            score: 0.5,
            embedding: None,
            similarity: None,
            valid_from: Utc::now(),
            valid_to: None,
            version: 2,
        }
    }

    #[test]
    fn test_evolution_prompt_lists_candidates_with_versions() {
        let new = ConceptInput::new("Solar kiln", "dries lumber");
        let prompt = build_evolution_prompt(&new, &[a_match("Wood drying")]);
        assert!(prompt.contains("Wood drying (v2)"));
        assert!(prompt.contains("Solar kiln: dries lumber"));
        assert!(prompt.contains("Context: none"));
    }

    #[test]
    fn test_ranking_prompt_contains_query_and_candidates() {
        let new = ConceptInput::new("A", "alpha");
        let prompt = build_ranking_prompt(&new, &[a_match("B"), a_match("C")]);
        assert!(prompt.contains("A: alpha"));
        assert!(prompt.contains("- B: desc"));
        assert!(prompt.contains("- C: desc"));
    }
}
