//! Instruction text sent to the model.
//!
//! Caller-supplied values are interpolated verbatim. The JSON field names in the
//! requested shape are the same constants the validator checks.

use prep_core::{ExplanationRequest, QuestionRequest};

use crate::validate::{ANSWER_FIELD, EXPLANATION_FIELD, QUESTION_FIELD, TITLE_FIELD};

/// Prompt asking for `number_of_questions` question/answer pairs as a bare
/// JSON array.
pub fn question_answer_prompt(request: &QuestionRequest) -> String {
    format!(
        r#"You are an AI trained to generate technical interview questions and answers.

Task:
- Role: {role}
- Candidate Experience: {experience}
- Focus Topics: {topic}
- Write exactly {count} interview questions.
- For each question, generate a detailed but beginner-friendly answer.
- If the answer needs a code example, add a small code block inside the answer text.
- Keep formatting very clean.
- Return a pure JSON array with exactly {count} objects, like:
[
  {{
    "{question_field}": "Question here?",
    "{answer_field}": "Answer here."
  }}
]
Important: Do NOT add any extra text. Only return valid JSON."#,
        role = request.role,
        experience = request.experience,
        topic = request.topic_to_focus,
        count = request.number_of_questions,
        question_field = QUESTION_FIELD,
        answer_field = ANSWER_FIELD,
    )
}

/// Prompt asking for exactly one JSON object explaining `question`.
pub fn concept_explain_prompt(request: &ExplanationRequest) -> String {
    format!(
        r#"You are an AI trained to generate explanations for a given interview question.

Task:
- Explain the following interview question and its concept in depth as if you're teaching a beginner developer.
- Question: "{question}"
- After the explanation, provide a short and clear title that summarizes the concept for the article or page header.
- If the explanation includes a code example, provide a small code block inside the explanation text.
- Keep the formatting very clean and clear.
- Return exactly one valid JSON object in the following format:
{{
  "{title_field}": "Short title here",
  "{explanation_field}": "Explanation here."
}}
Important: Do NOT add any extra text outside the JSON format. Only return valid JSON."#,
        question = request.question,
        title_field = TITLE_FIELD,
        explanation_field = EXPLANATION_FIELD,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_request() -> QuestionRequest {
        QuestionRequest {
            role: "Frontend Developer".to_string(),
            experience: "2 years".to_string(),
            topic_to_focus: "React, hooks, \"state\" management".to_string(),
            number_of_questions: 7,
        }
    }

    #[test]
    fn question_prompt_interpolates_inputs_verbatim() {
        let prompt = question_answer_prompt(&question_request());

        assert!(prompt.contains("- Role: Frontend Developer\n"));
        assert!(prompt.contains("- Candidate Experience: 2 years\n"));
        assert!(prompt.contains("- Focus Topics: React, hooks, \"state\" management\n"));
        assert!(prompt.contains("exactly 7 interview questions"));
        assert!(prompt.contains("exactly 7 objects"));
    }

    #[test]
    fn question_prompt_names_validator_fields() {
        let prompt = question_answer_prompt(&question_request());
        assert!(prompt.contains("\"question\": \"Question here?\""));
        assert!(prompt.contains("\"answer\": \"Answer here.\""));
        assert!(prompt.contains("Only return valid JSON"));
    }

    #[test]
    fn question_prompt_is_deterministic() {
        let request = question_request();
        assert_eq!(
            question_answer_prompt(&request),
            question_answer_prompt(&request)
        );
    }

    #[test]
    fn explanation_prompt_requests_single_object() {
        let prompt = concept_explain_prompt(&ExplanationRequest {
            question: "What is the event loop?".to_string(),
        });

        assert!(prompt.contains("- Question: \"What is the event loop?\""));
        assert!(prompt.contains("exactly one valid JSON object"));
        assert!(prompt.contains("\"title\": \"Short title here\""));
        assert!(prompt.contains("\"explanation\": \"Explanation here.\""));
    }
}
