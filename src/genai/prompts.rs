use super::{ArchetypeInput, CommentaryInput, FitReportInput, GenAiResult};

/// System prompt that enforces JSON-only output for structured responses.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

pub const COMMENTARY_SYSTEM: &str = "You are an experienced HR assessor. \
    Respond with exactly one plain sentence, no lists, no preamble.";

pub fn commentary_prompt(input: &CommentaryInput) -> String {
    let mut prompt = format!(
        "A candidate answered a personality-assessment question.\n\
         Question: {}\nAnswer: {}\n",
        input.question, input.answer
    );
    if let Some(dimension) = &input.dimension {
        prompt.push_str(&format!("Measured dimension: {dimension}\n"));
    }
    prompt.push_str(
        "Write one neutral, professional sentence commenting on what this \
         answer suggests about the candidate.",
    );
    prompt
}

pub fn fit_report_prompt(input: &FitReportInput) -> GenAiResult<String> {
    let context = serde_json::to_string_pretty(input)?;
    Ok(format!(
        "Assess how well the candidate fits the open position based only on \
         the context below. Do not invent facts that are not in the context.\n\
         \n{context}\n\
         \nRespond with a JSON object of this exact shape:\n\
         {{\n  \"summary\": \"2-3 sentence overall assessment\",\n  \
         \"strengths\": [\"...\"],\n  \"concerns\": [\"...\"],\n  \
         \"recommendation\": \"advance | hold | reject, with one sentence of reasoning\"\n}}"
    ))
}

pub fn archetype_prompt(input: &ArchetypeInput) -> GenAiResult<String> {
    let scores = serde_json::to_string(&input.big_five)?;
    Ok(format!(
        "Given these normalized Big Five scores (0-100) and DISC type, name a \
         short personality archetype.\n\
         Big Five: {scores}\nDISC type: {}\n\
         \nRespond with a JSON object of this exact shape:\n\
         {{ \"archetype\": \"two or three word label\", \"description\": \"one sentence\" }}",
        input.disc_type
    ))
}
