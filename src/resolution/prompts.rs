//! Prompt templates for the two resolution phases.
//!
//! Both prompts end with the same envelope instructions so that
//! [`extract_answer`](super::parser::extract_answer) can pull the payload out
//! no matter how much the model writes around it.

use super::parser::{ANSWER_MARKER, NOTES_MARKER};

/// Output-format instructions shared by both phases.
pub fn envelope_instructions(placeholder: &str) -> String {
    format!(
        "Your answer must be in the following format:\n\n\
         {ANSWER_MARKER}\n\
         {placeholder}\n\
         {NOTES_MARKER}\n\
         Note: Any additional comments you would like to provide."
    )
}

/// System instruction for phase 1: pick one capability by qualified name.
pub fn selection_prompt(catalog: &str) -> String {
    format!(
        r#"Your current task is to select a function by name which is most likely to resolve the user's request.

The following functions are available:
{catalog}

Answer ONLY with a function name, provide no explanation inside the answer section.

Example:
- user: "What is the weather like today?"
- you:
{ANSWER_MARKER}
search.google
{NOTES_MARKER}

Counterexample, do NOT do this:
- user: "I wonder what Pandas look like"
- you:
{ANSWER_MARKER}
I think you should search.google because ...
{NOTES_MARKER}

Example:
- user: "Hey bot what's the square root of 16"
- you:
{ANSWER_MARKER}
math.solve
{NOTES_MARKER}

Counterexample, do NOT do this:
- user: "What is 1 + 1?"
- you:
{ANSWER_MARKER}
math.solve Note: bla bla bla ...
{NOTES_MARKER}

{envelope}"#,
        envelope = envelope_instructions("WRITE FUNCTION NAME HERE"),
    )
}

/// System instruction for phase 2: synthesize the argument for `qualified_name`.
pub fn argument_prompt(qualified_name: &str, documentation: &str) -> String {
    format!(
        r#"Your current task is to provide the input for the function '{qualified_name}' most likely to resolve the user's request.

You are given the following function for which you must provide an input to respond to the user.

---
{documentation}
---

Answer ONLY with the input for the function, provide no explanation inside the answer section.

Example: (in context of search.google)
- user: "Hey how do I do python programming?"
- you:
{ANSWER_MARKER}
'introduction to python programming'
{NOTES_MARKER}

Counterexample, do NOT do this: (in context of search.google)
- user: "Hey how do I do python programming?"
- you:
{ANSWER_MARKER}
Well you should search for 'python programming' because ...
{NOTES_MARKER}

Example: (in context of math.solve)
- user: "What is 1 + 1?"
- you:
{ANSWER_MARKER}
'1 + 1'
{NOTES_MARKER}

Counterexample, do NOT do this: (in context of math.solve)
- user: "What is 1 + 1?"
- you:
{ANSWER_MARKER}
'1 + 1' Note: bla bla bla ...
{NOTES_MARKER}

{envelope}"#,
        envelope = envelope_instructions("WRITE INPUT HERE"),
    )
}
