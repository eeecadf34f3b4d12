use crate::llm::ChatMessage;

/// Reaction archetypes and the share of the batch each should make up.
/// The model is asked to approximate these; nothing checks the result.
pub const PERSONAS: &[(&str, u32)] = &[
    ("Hype person (enthusiastic, emojis)", 15),
    ("Skeptic (asks hard questions)", 20),
    ("Technical expert (specific concerns)", 20),
    ("Encourager (positive but vague)", 15),
    ("Confused (misunderstood the idea)", 10),
    ("Contrarian (disagrees on principle)", 10),
    ("Thoughtful (constructive feedback)", 10),
];

pub const LENGTH_MIX: &[(&str, u32)] = &[
    ("Short (1-10 words)", 30),
    ("Medium (1-2 sentences)", 50),
    ("Detailed (3-4 sentences)", 20),
];

const REALISM_RULES: &[&str] = &[
    "Mix of casual and professional language",
    "Occasional typos (but not every tweet)",
    "Vary emoji usage - some tweets have them, most don't",
    "Some users didn't read carefully",
    "Include specific technical questions when relevant",
    "Mix writing styles",
    "Realistic usernames (@tech_guru, @startup_guy, etc.)",
    "Keep under 280 characters",
];

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT (MUST BE VALID JSON):
{
  "tweets": [
    {
      "author": "@realistic_username",
      "text": "tweet content here",
      "sentiment": "praise" | "neutral" | "worry"
    }
  ]
}"#;

fn push_distribution(out: &mut String, heading: &str, rows: &[(&str, u32)]) {
    out.push_str(heading);
    out.push('\n');
    for (label, pct) in rows {
        out.push_str(&format!("- {label}: {pct}%\n"));
    }
    out.push('\n');
}

pub fn system_prompt(audience: &str, count: u32) -> String {
    let mut prompt = format!(
        "You are simulating realistic Twitter/X reactions to an idea.\n\n\
         AUDIENCE: {audience}\n\
         Generate exactly {count} unique tweet responses.\n\n"
    );

    push_distribution(&mut prompt, "PERSONALITY DISTRIBUTION:", PERSONAS);
    push_distribution(&mut prompt, "LENGTH DISTRIBUTION:", LENGTH_MIX);

    prompt.push_str("REALISM RULES:\n");
    for rule in REALISM_RULES {
        prompt.push_str(&format!("- {rule}\n"));
    }

    prompt.push_str(
        "\nSENTIMENT:\n\
         - \"praise\": Positive, supportive, excited\n\
         - \"neutral\": Questions, curious, observing\n\
         - \"worry\": Concerns, skepticism, criticism\n\n",
    );
    prompt.push_str(OUTPUT_FORMAT);
    prompt
}

pub fn user_prompt(idea_text: &str, count: u32) -> String {
    format!(
        "Simulate Twitter reactions to this idea:\n\n\"{idea_text}\"\n\n\
         Generate exactly {count} diverse, realistic tweets."
    )
}

/// System instruction followed by the user instruction, in the order the
/// completion API expects them.
pub fn reaction_messages(idea_text: &str, audience: &str, count: u32) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(audience, count)),
        ChatMessage::user(user_prompt(idea_text, count)),
    ]
}
