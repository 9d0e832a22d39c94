use anyhow::Context;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Person,
    Location,
    Organization,
}

impl FromStr for EntityLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSON" => Ok(EntityLabel::Person),
            "LOCATION" => Ok(EntityLabel::Location),
            "ORGANIZATION" => Ok(EntityLabel::Organization),
            other => Err(anyhow::anyhow!("Unknown entity label: {}", other)),
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Location => "LOCATION",
            EntityLabel::Organization => "ORGANIZATION",
        })
    }
}

/// A tagged run of text, as byte offsets into the classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

/// Assigns entity categories to the tokens of one line of text.
pub trait EntityTagger: Send + Sync {
    fn classify(&self, line: &str) -> anyhow::Result<Vec<EntitySpan>>;
}

/// Gazetteer tagger: every known token carries a fixed label.
///
/// The lexicon is a text file with one `token<TAB>LABEL` entry per line;
/// blank lines and lines starting with `#` are ignored. Lookups ignore case
/// and leading/trailing punctuation. Adjacent tokens with the same label are
/// reported as one span.
#[derive(Debug, Clone)]
pub struct LexiconTagger {
    entries: HashMap<String, EntityLabel>,
}

impl LexiconTagger {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read entity lexicon {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid entity lexicon {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut entries = HashMap::new();

        for (number, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (token, label) = line
                .split_once('\t')
                .ok_or_else(|| anyhow::anyhow!("Line {}: expected token<TAB>LABEL", number + 1))?;
            let label: EntityLabel = label
                .parse()
                .with_context(|| format!("Line {}", number + 1))?;
            entries.insert(normalize(token), label);
        }

        if entries.is_empty() {
            anyhow::bail!("Entity lexicon has no entries");
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens(line: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                found.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        found.push((s, &line[s..]));
    }

    found
}

impl EntityTagger for LexiconTagger {
    fn classify(&self, line: &str) -> anyhow::Result<Vec<EntitySpan>> {
        let mut spans: Vec<EntitySpan> = Vec::new();

        for (start, token) in tokens(line) {
            let Some(&label) = self.entries.get(&normalize(token)) else {
                continue;
            };
            let end = start + token.len();

            match spans.last_mut() {
                Some(last) if last.label == label && line[last.end..start].trim().is_empty() => {
                    last.end = end;
                }
                _ => spans.push(EntitySpan { label, start, end }),
            }
        }

        Ok(spans)
    }
}
