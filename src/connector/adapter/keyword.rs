/// Words too common in task descriptions to say anything about relevance.
const STOP_WORDS: &[&str] = &[
    "the", "an", "and", "or", "some", "any", "all", "which", "that", "this", "these", "those",
    "for", "from", "in", "on", "at", "to", "of", "with", "by", "via", "into", "is", "are", "was",
    "were", "be", "been", "being", "do", "does", "did", "have", "has", "had", "can", "could",
    "will", "would", "should", "may", "might", "how", "what", "where", "when", "it", "its", "my",
    "me", "we", "our", "you", "your",
];

/// Split text into lowercase search terms, dropping stop words and
/// single-character fragments.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 1)
        .map(|word| word.to_lowercase())
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .collect()
}
