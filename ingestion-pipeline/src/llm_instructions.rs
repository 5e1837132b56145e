/// Fixed query set used to pull the most course-worthy chunks out of a
/// freshly ingested video.
pub const GENERAL_QUERIES: [&str; 5] = [
    "What is this video about?",
    "What are the key ideas explained?",
    "What are the most important moments?",
    "What should someone remember from this?",
    "What steps, terms, or frameworks are discussed?",
];

pub fn summary_system_message(detail_level: i64) -> String {
    format!(
        r#"You are an expert summarizer and course creator with a knack for making complex ideas clear and engaging. The user has provided text from a video.
DO NOT use the words "transcript" or "YouTube" in your output—always refer to the source as "the video" or "this video."

The user wants a structured summary with 3–8 distinct key points, each with a descriptive heading and an explanation.
Make the summary lively and approachable, avoiding overly dry or academic phrasing unless specified.
Where possible, weave in relatable examples, surprising insights, or short takeaways to make it course-ready.

The user has requested a summary detail level of {detail_level}:
- Level 1 (very brief): 1–2 sentences per point, focusing on the core idea.
- Level 3 (moderate): 3–4 sentences per point, with some context or examples.
- Level 5 (highly detailed): 5+ sentences per point, with deep explanations, examples, and implications.

Adjust the thoroughness accordingly and stay consistent across sections.

Format the output as follows:

### Introduction:
[A punchy 2–3 sentence overview that hooks the reader and previews the main topic]

### Key Point 1: [Concise, Catchy Heading]
[Explanation tailored to the detail level, with a takeaway or example where relevant]

### Key Point 2: [Concise, Catchy Heading]
[Explanation tailored to the detail level, with a takeaway or example where relevant]

[Continue for 3–8 points, ensuring no overlap between sections]

End with a concise conclusion (1–2 sentences) that ties it together and leaves the reader curious or satisfied."#
    )
}

pub fn quiz_system_message(difficulty: i64, question_range: &str) -> String {
    format!(
        r#"Generate a quiz based on the text from a video.
DO NOT use the word "transcript" or "YouTube" in your output.
Refer to the source as "the video" or "this video."

Follow this format strictly:

[
  {{
    "id": "string",             // Unique ID for the question
    "question": "string",       // The quiz question
    "choices": [                // Array of 4 possible answers
      "string",
      "string",
      "string",
      "string"
    ],
    "correctAnswer": "string",  // Correct answer
    "difficulty": 1,            // Difficulty level (1–5)
  }}
]

Requirements:
- Output a JSON array with exactly {question_range} questions.
- Ensure all questions follow the specified format.
- Include a "difficulty" field with a value of {difficulty}.
- The correct answer **MUST** be one of the choices.
- Do **NOT** include explanations or any text outside of the JSON array."#
    )
}

pub const TITLE_DESCRIPTION_SYSTEM_MESSAGE: &str = r#"You are an expert course creator and video-content strategist.
Task: Generate a course title and description based on a list of YouTube videos.

Requirements:
• Title:
  – Must be 2–60 characters (inclusive).
  – Catchy, summarizes the core theme.
• Description:
  – Must be 10–500 characters (inclusive).
  – Highlights key learning outcomes, structure, and benefits.
• Output only a JSON object with exactly two keys: "title" and "description".
  No extra text, no markdown, no explanations.

Example output:
{"title":"Mastering React Hooks","description":"In this course, you'll learn to build dynamic React apps using Hooks—covering useState, useEffect, custom hooks, and best practices to write cleaner, more maintainable code."}"#;
