//! The static reply used when model delegation fails.

use digibuddy_core::KnowledgeBase;

const APOLOGY: &str = "I'm sorry, I'm having trouble connecting to my knowledge system at the moment.";
const REDIRECT: &str =
    "For digital literacy assistance, you might want to try one of these common topics:";

/// Render the fallback reply, listing every knowledge-base topic so the user
/// is pointed at questions that still get an answer.
pub fn render_fallback(knowledge: &KnowledgeBase) -> String {
    let mut text = format!("{APOLOGY} {REDIRECT}\n");
    for entry in knowledge.entries() {
        text.push_str("\n- ");
        text.push_str(entry.topic_label());
    }
    text
}
