//! Prompt text for the collage judge and the diary writer

/// Emotion labels the diary classifier may answer with
pub const EMOTION_LABELS: [&str; 9] = [
    "love",
    "depression",
    "happy",
    "smile",
    "cool",
    "proud",
    "sneaky",
    "annoyed",
    "angry",
];

const SELECTION_CRITERIA: &str = "\
Aesthetically strong images:
- are sharp and in focus
- are high quality with a balanced composition
- have natural light, good contrast and correct exposure
- have a harmonious color scheme and an appealing atmosphere

Prefer variety of subject matter (landscapes, people, food, architecture, ...).
Evaluate every numbered image in every collage. Do not skip any.";

const OUTPUT_FORMAT: &str = "\
Answer with the chosen image numbers only, best first, separated by commas.
Example: 3, 7, 12
No greeting, no scores, no explanation, no other formatting.";

/// Instructions for the collage judge
///
/// `num_reference` is the number of reference images shown in the reference
/// collage; `top_k` is how many candidates to pick.
pub fn collage_selection_prompt(num_reference: usize, top_k: usize) -> String {
    if num_reference == 0 {
        return format!(
            "You are given one or more 4x4 collages of photos. Each photo has a red number \
             in its upper-left corner.\n\n\
             Pick the {top_k} photos that are both aesthetically strong and visually distinct \
             from each other.\n\n{SELECTION_CRITERIA}\n\n{OUTPUT_FORMAT}\n\n\
             Return exactly {top_k} numbers."
        );
    }

    format!(
        "You are given a sequence of images.\n\n\
         - The first image is a collage of {num_reference} reference photos. They were already \
         chosen; never pick them and avoid photos that closely resemble them.\n\
         - The remaining images are 4x4 collages of candidate photos. Each candidate has a red \
         number in its upper-left corner. Pick only from these.\n\n\
         Pick the {top_k} candidates that are aesthetically strong and clearly different from \
         every reference photo. Skip any candidate that is 75% or more similar to a reference.\n\n\
         {SELECTION_CRITERIA}\n\n{OUTPUT_FORMAT}\n\n\
         Return exactly {top_k} candidate numbers."
    )
}

/// Instructions for writing a diary from photos in the user's own voice
pub fn diary_prompt(user_speech: &str, image_information: &str) -> String {
    format!(
        "You are writing a personal diary entry on behalf of the user.\n\n\
         The photos attached after this message were taken on the same day, in the order \
         listed below. Write one diary entry that:\n\
         - walks through the photos in that order\n\
         - describes what each photo shows and how the moment felt, with at least two full \
         sentences per photo\n\
         - uses the date, place and keywords only where they fit naturally\n\
         - reads as one continuous entry, not a list\n\n\
         Match the user's voice. Here is a sample of how the user normally speaks or writes:\n\
         \"\"\"\n{user_speech}\n\"\"\"\n\
         Mirror its tone, sentence length, pacing and expressiveness without reusing its phrases. \
         Write in the same language as the sample.\n\n\
         Photo information:\n{image_information}\n\n\
         Output only the diary text. No title, no headings, no emoji, no commentary."
    )
}

/// Instructions for labelling the dominant emotion of a diary
pub fn emotion_prompt(diary: &str) -> String {
    let labels = EMOTION_LABELS
        .iter()
        .map(|label| format!("- {}", label))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are reading a diary entry to find its dominant emotional tone.\n\n\
         First find the emotionally expressive passages, especially strong reactions such as \
         frustration, excitement, pride or discomfort. Then choose the single label below that \
         best matches the strongest of them, even if it appears late in the entry.\n\n\
         Labels:\n{labels}\n\n\
         Diary:\n{diary}\n\n\
         Answer with the label only, on one line, with no explanation."
    )
}

/// Instructions for editing an existing diary on request
///
/// Sentences the user wants changed arrive wrapped in `@...@`.
pub fn diary_modify_prompt(user_speech: &str, diary: &str, user_request: &str) -> String {
    let labels = EMOTION_LABELS.join(", ");

    format!(
        "You are revising a diary entry the user already has.\n\n\
         Rules:\n\
         1. Apply the user's request. If some sentences are wrapped in @...@, change only those \
         sentences and keep every other sentence as it is.\n\
         2. Keep the user's voice. Here is a sample of how the user normally speaks or writes:\n\
         \"\"\"\n{user_speech}\n\"\"\"\n\
         3. If the request changes the mood, make the transition gradual and natural.\n\
         4. Remove the @ markers from the result.\n\n\
         Current diary:\n{diary}\n\n\
         User request:\n{user_request}\n\n\
         After rewriting, choose the one label that best fits the dominant mood of the whole \
         entry from: {labels}.\n\n\
         Answer in exactly this format:\n\
         <DIARY>\n(revised diary)\n</DIARY>\n\
         <EMOTION>\n(label)\n</EMOTION>"
    )
}
