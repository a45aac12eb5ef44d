//! Text normalization and alias matching.

/// Lower-cased utterance plus its token sequence.
///
/// Tokens are runs of ASCII alphanumerics or runs of other non-separator
/// characters, so "2023年f1车手" splits into `2023`, `年`, `f1`, `车手`.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    pub tokens: Vec<String>,
}

impl Normalized {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        Self {
            tokens: tokenize(&text),
            text,
        }
    }

    /// Whether `seq` occurs as consecutive tokens.
    pub fn contains_tokens(&self, seq: &[String]) -> bool {
        !seq.is_empty() && self.tokens.windows(seq.len()).any(|window| window == seq)
    }

    /// ASCII tokens only.
    pub fn ascii_tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .filter(|t| t.is_ascii())
    }
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum CharClass {
    Ascii,
    Other,
    Separator,
}

fn classify(c: char) -> CharClass {
    if c.is_ascii_alphanumeric() {
        CharClass::Ascii
    } else if c.is_whitespace() || c.is_ascii_punctuation() || is_cjk_punctuation(c) {
        CharClass::Separator
    } else if c.is_ascii() {
        CharClass::Separator
    } else {
        CharClass::Other
    }
}

fn is_cjk_punctuation(c: char) -> bool {
    matches!(c, '\u{3000}'..='\u{303F}' | '\u{FF00}'..='\u{FF0F}' | '\u{FF1A}'..='\u{FF20}')
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut class = CharClass::Separator;

    for c in text.chars() {
        let next = classify(c);
        if next != class && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if next != CharClass::Separator {
            current.push(c);
        }
        class = next;
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// A keyword or alias compiled for matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// ASCII words matched as whole consecutive tokens.
    Tokens(Vec<String>),
    /// Text containing non-ASCII characters, matched as a substring.
    Text(String),
}

impl Pattern {
    pub fn parse(alias: &str) -> Self {
        let lower = alias.trim().to_lowercase();
        if lower.is_ascii() {
            Pattern::Tokens(tokenize(&lower))
        } else {
            Pattern::Text(lower)
        }
    }

    pub fn matches(&self, text: &Normalized) -> bool {
        match self {
            Pattern::Tokens(seq) => text.contains_tokens(seq),
            Pattern::Text(s) => text.text.contains(s.as_str()),
        }
    }

    /// Length in characters, used to prefer longer aliases.
    pub fn len(&self) -> usize {
        match self {
            Pattern::Tokens(seq) => {
                seq.iter().map(|t| t.len()).sum::<usize>() + seq.len().saturating_sub(1)
            }
            Pattern::Text(s) => s.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single ASCII word this pattern consists of, if any.
    pub fn single_word(&self) -> Option<&str> {
        match self {
            Pattern::Tokens(seq) if seq.len() == 1 => Some(seq[0].as_str()),
            _ => None,
        }
    }
}

/// Optimal string alignment distance (Levenshtein plus adjacent transpositions).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }
    d[n][m]
}

/// Maximum edit distance tolerated for a word of `len` characters.
pub fn fuzzy_threshold(len: usize) -> usize {
    (len / 4).max(1)
}
