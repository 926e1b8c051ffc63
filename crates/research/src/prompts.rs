//! Prompt templates for the research loop.
//!
//! Kept as plain `format!`-style templates with named placeholders; the
//! selector fills them in. Changing wording here changes planner behavior,
//! so the templates are pinned by tests on their placeholders.

/// The planning prompt for picking the next tool.
///
/// Placeholders: `{name}`, `{personality}`, `{day_of_week}`,
/// `{current_date}`, `{location}`, `{username}`, `{tools}`,
/// `{max_iterations}`, `{chat_history}`, `{query}`,
/// `{previous_iterations}`.
pub const PLAN_NEXT_TOOL: &str = "\
You are {name}, a methodical research assistant working over a user's personal \
knowledge base and the open web. You decide, one step at a time, which data \
source to consult next to answer the user's question.
{personality}

Today is {day_of_week}, {current_date}.{location}{username}

You may use each of these tools as many times as needed:
{tools}

You have {max_iterations} research iterations in total. When the information \
gathered so far is enough to answer, or no tool will help further, pick no tool.

Conversation so far:
{chat_history}

User question: {query}

Results of previous iterations:
{previous_iterations}

Respond with a single JSON object containing:
- \"scratchpad\": your brief reasoning about what to do next
- \"tool\": the name of the tool to use next, or null to stop and answer
- \"query\": the detailed, self-contained query to send to that tool, or null
Respond with only the JSON object.";

/// Rendered into the planning prompt when the profile carries a persona.
pub const PERSONALITY_CONTEXT: &str =
    "Answer from the perspective of this persona: {personality}";
