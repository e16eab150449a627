//! Lyric analysis: syllable counts and rhyme-scheme detection
//!
//! Both passes are deliberately rough text heuristics, not phonetics.
//! Syllables come from vowel-group counting with a couple of English
//! spelling corrections, and two lines "rhyme" when the last two characters
//! of their final words match. "love"/"move" therefore do not rhyme here
//! while "cat"/"bat" do; that trade-off is accepted.

use serde::{Deserialize, Serialize};

/// One non-blank lyric line with its per-word syllable estimate and the
/// trailing key used for rhyme matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    pub text: String,
    pub words: Vec<String>,
    pub syllables: Vec<usize>,
    pub total_syllables: usize,
    pub rhyme_key: Option<String>,
}

/// Analysis of a whole lyric sheet. `rhyme_scheme` has one label per line;
/// equal labels share a rhyme key suffix, and "X" marks lines with no
/// extractable key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricAnalysis {
    pub lines: Vec<LyricLine>,
    pub rhyme_scheme: Vec<String>,
}

impl LyricAnalysis {
    pub fn total_syllables(&self) -> usize {
        self.lines.iter().map(|l| l.total_syllables).sum()
    }
}

/// Analyze free lyric text: split into non-blank lines, estimate syllables
/// per word, extract rhyme keys, and label the rhyme scheme.
pub fn analyze(text: &str) -> LyricAnalysis {
    let lines: Vec<LyricLine> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(analyze_line)
        .collect();

    let rhyme_scheme = detect_rhyme_scheme(&lines);

    LyricAnalysis {
        lines,
        rhyme_scheme,
    }
}

fn analyze_line(line: &str) -> LyricLine {
    let words: Vec<String> = line.split_whitespace().map(|w| w.to_string()).collect();
    let syllables: Vec<usize> = words.iter().map(|w| count_syllables(w)).collect();
    let total_syllables = syllables.iter().sum();

    let rhyme_key = words
        .iter()
        .rev()
        .map(|w| strip_to_letters(w))
        .find(|w| !w.is_empty())
        .map(|w| tail(&w, 3));

    LyricLine {
        text: line.to_string(),
        words,
        syllables,
        total_syllables,
        rhyme_key,
    }
}

fn strip_to_letters(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

fn tail(s: &str, n: usize) -> String {
    let start = s.len().saturating_sub(n);
    s[start..].to_string()
}

/// Estimate syllables by counting vowel groups, with corrections: a
/// trailing silent "e" subtracts one, a trailing "le" adds one back, and
/// every word counts at least one.
pub fn count_syllables(word: &str) -> usize {
    let word = strip_to_letters(word);
    if word.is_empty() {
        return 1;
    }
    if word.len() <= 3 {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut groups = 0usize;
    let mut in_group = false;
    for c in word.chars() {
        if is_vowel(c) {
            if !in_group {
                groups += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }

    let mut count = groups.max(1) as isize;
    if word.ends_with('e') {
        count -= 1;
    }
    if word.ends_with("le") && word.len() > 2 {
        count += 1;
    }
    count.max(1) as usize
}

/// Two keys rhyme when their final two characters agree.
fn keys_rhyme(a: &str, b: &str) -> bool {
    tail(a, 2) == tail(b, 2)
}

/// Greedy order-preserving labeling: the first line of each new rhyme sound
/// claims the next unused letter; later lines matching an earlier key reuse
/// its label. Keyless lines are labeled "X" and never match anything.
fn detect_rhyme_scheme(lines: &[LyricLine]) -> Vec<String> {
    let mut scheme = Vec::with_capacity(lines.len());
    let mut seen: Vec<(String, String)> = Vec::new(); // (label, key) in order
    let mut next_label = b'A';

    for line in lines {
        let key = match &line.rhyme_key {
            Some(k) => k,
            None => {
                scheme.push("X".to_string());
                continue;
            }
        };

        if let Some((label, _)) = seen.iter().find(|(_, k)| keys_rhyme(key, k)) {
            scheme.push(label.clone());
        } else {
            let label = (next_label as char).to_string();
            next_label += 1;
            seen.push((label.clone(), key.clone()));
            scheme.push(label);
        }
    }

    scheme
}
