//! Text normalisation and tokenization for indexing and queries

use std::collections::HashSet;
use std::sync::OnceLock;

/// Common English words that carry no ranking signal
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Lowercases, replaces punctuation with spaces and collapses whitespace
///
/// ```
/// use ripple_search::search::clean_text;
///
/// assert_eq!(clean_text("  Hello,   World! "), "hello world");
/// ```
pub fn clean_text(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if is_word_char(c) { c } else { ' ' })
        .collect();
    replaced
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits cleaned text into tokens of at least two word characters, stop words removed
pub fn tokenize(cleaned: &str) -> Vec<&str> {
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !is_stop_word(token))
        .collect()
}

/// Produces unigrams followed by bigrams of the filtered token stream
pub fn terms(text: &str) -> Vec<String> {
    let cleaned = clean_text(text);
    let tokens = tokenize(&cleaned);

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("Web-Development: with_Python!"), "web development with_python");
        assert_eq!(clean_text("\n\t"), "");
    }

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let cleaned = clean_text("A guide to the C language and Rust");
        assert_eq!(tokenize(&cleaned), vec!["guide", "language", "rust"]);
    }

    #[test]
    fn test_terms_include_bigrams_after_stop_words() {
        let terms = terms("Python for data science");
        assert_eq!(
            terms,
            vec![
                "python",
                "data",
                "science",
                "python data",
                "data science"
            ]
        );
    }

    #[test]
    fn test_terms_empty() {
        assert!(terms("").is_empty());
        assert!(terms("the and of").is_empty());
    }
}
