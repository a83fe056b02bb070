//! Prompt assembly for card generation and topic scanning.

use pdfdeck_core::{AnswerFormat, CardType, Language};

use crate::generator::GenerationRequest;

const ROLE: &str = "You are an expert in learning materials and exam preparation. \
Your only task is to write high-quality flashcards from academic texts.";

const SELF_CONTAINED: &str = "\
SELF-CONTAINED CARDS
Every card must be answerable by someone who has never seen the source document.
Name every concept, person, institution, method and formula explicitly.
Never write \"the method\", \"this approach\", \"in the text\" or \"according to the author\".";

const QUALITY: &str = "\
QUALITY
- Only exam-relevant content, no trivia.
- Each card tests exactly one atomic concept with one precise answer.
- Prefer understanding (why, how, what is the difference) over bare recall.
- For formulas, state what the variables mean and when the formula applies.";

const FORBIDDEN: &str = "\
FORBIDDEN
- Chapter headings, author names, page numbers.
- Yes/no questions and trivial definitions.
- Overview or list questions whose answer needs three or more separate items. \
Write one card per item instead.
- Redundant or near-identical cards.";

const ATOMICITY: &str = "\
ATOMICITY
An answer holds exactly one independent fact. If removing a sentence or bullet \
leaves a complete answer, split the card.";

const EXHAUSTIVE: &str = "\
COVERAGE
Work through every paragraph. Cover every definition, mechanism, comparison, \
cause and effect, condition and exception that appears in the text.";

const FORMAT_BASIC: &str = "\
CARD FORMAT: basic question and answer
OUTPUT: {\"cards\": [{\"front\": \"Question\", \"back\": \"Answer\"}]}";

const FORMAT_CLOZE: &str = "\
CARD FORMAT: cloze
Write complete, informative sentences and mark only the key term with {{c1::term}}. \
Further blanks in the same sentence use {{c2::term}}, {{c3::term}}.
OUTPUT: {\"cards\": [{\"text\": \"Sentence with {{c1::blank}}\"}]}";

const FORMAT_BOTH: &str = "\
CARD FORMAT: mixed
Use basic cards for concepts, processes and comparisons; cloze cards for key terms, \
definitions and formulas. Aim for roughly 55% basic and 45% cloze.
OUTPUT: {\"cards\": [{\"type\": \"basic\", \"front\": \"...\", \"back\": \"...\"}, \
{\"type\": \"cloze\", \"text\": \"...{{c1::...}}...\"}]}";

const ANSWER_SENTENCES: &str = "Answers: one or two concise sentences. \
If an answer needs more, split it into several cards.";

const ANSWER_BULLETS: &str = "Answers: bullet points only, each starting with \"• \". \
One to three bullets per card; a single fact is a single bullet.";

const TOPIC_SYSTEM: &str = "\
You identify the main subject areas of a document.
Extract the 4-8 broad, chapter-level topics of the ENTIRE document.
- Each topic covers a significant portion of the material.
- Use the document's own terminology.
- Merge related sub-topics; never list more than 8.
- Do not invent topics and do not list \"Introduction\", \"Overview\" or \"Summary\".
OUTPUT: {\"topics\": [{\"name\": \"Topic Name\", \"description\": \"One sentence on what it covers\"}]}";

/// System prompt for one card type, answer format, and output language.
pub fn card_system_prompt(card_type: CardType, answer_format: AnswerFormat, language: Language) -> String {
    let answers = match answer_format {
        AnswerFormat::Sentences => ANSWER_SENTENCES,
        AnswerFormat::Bullets => ANSWER_BULLETS,
    };

    let basic_answers = format!("For basic cards: {answers}");
    let language_rule = language_instruction(language);

    let mut parts = vec![ROLE, SELF_CONTAINED, QUALITY, FORBIDDEN];
    match card_type {
        CardType::Basic => parts.extend([ATOMICITY, EXHAUSTIVE, FORMAT_BASIC, answers]),
        // One blank is one fact, so cloze prompts skip the atomicity block.
        CardType::Cloze => parts.extend([EXHAUSTIVE, FORMAT_CLOZE]),
        CardType::Both => parts.extend([ATOMICITY, EXHAUSTIVE, FORMAT_BOTH, basic_answers.as_str()]),
    }
    parts.push(language_rule.as_str());
    parts.join("\n\n")
}

/// User message carrying the chunk text, and the topic list when restricted.
pub fn card_user_message(request: &GenerationRequest) -> String {
    let mut lines = vec![format!(
        "Create flashcards from the following text ({}).",
        page_label(request.first_page, request.last_page)
    )];

    if request.topics.is_empty() {
        lines.push("Be exhaustive and skip only what is truly trivial.".to_string());
    } else {
        lines.push("Only cover content that belongs to one of these topics:".to_string());
        for topic in &request.topics {
            lines.push(format!("  • {topic}"));
        }
        lines.push(String::new());
        lines.push("Add a \"topic\" field to every card with the verbatim topic name.".to_string());
        lines.push("If no content matches any topic, return {\"cards\": []}.".to_string());
        lines.push("Never invent information that is not in the text.".to_string());
    }

    lines.push(String::new());
    lines.push("<text>".to_string());
    lines.push(request.text.clone());
    lines.push("</text>".to_string());
    lines.push(String::new());
    lines.push("Reply ONLY with the JSON object.".to_string());
    lines.join("\n")
}

pub fn topic_system_prompt(language: Language) -> String {
    format!("{TOPIC_SYSTEM}\n\n{}", language_instruction(language))
}

pub fn topic_user_message(excerpts: &str) -> String {
    format!(
        "Identify the 4-8 main topics of the following excerpts, sampled from across the whole document.\n\n\
         <document_excerpts>\n{excerpts}\n</document_excerpts>\n\n\
         Reply ONLY with the JSON object."
    )
}

/// Human page label from 0-based indices: `pages 3-7` or `page 3`.
pub fn page_label(first_page: usize, last_page: usize) -> String {
    if first_page == last_page {
        format!("page {}", first_page + 1)
    } else {
        format!("pages {}–{}", first_page + 1, last_page + 1)
    }
}

fn language_instruction(language: Language) -> String {
    let name = language.english_name();
    format!("Respond exclusively in {name}. All output text must be written in {name}.")
}
