//! `{TOKEN}` substitution against an [`ItemDataSource`].

use crate::placeholder::source::{ItemDataSource, LocalizedNames};

/// Placeholder tokens understood by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// The item identifier itself.
    Indeks,
    NazwaPl,
    NazwaEn,
    Opis,
    Materialy,
}

impl Token {
    pub const ALL: [Self; 5] = [
        Self::Indeks,
        Self::NazwaPl,
        Self::NazwaEn,
        Self::Opis,
        Self::Materialy,
    ];

    /// Case-insensitive lookup of a token name (without braces).
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Indeks => "INDEKS",
            Self::NazwaPl => "NAZWA_PL",
            Self::NazwaEn => "NAZWA_EN",
            Self::Opis => "OPIS",
            Self::Materialy => "MATERIALY",
        }
    }
}

/// Diagnostic text shown in place of a token whose lookup failed.
pub fn diagnostic(token: Token) -> String {
    format!("[no data: {{{}}}]", token.name())
}

/// Resolves placeholders for one item during one render pass.
///
/// Each logical lookup hits the data source at most once per resolver, whatever the number of
/// overlays or occurrences; failures are cached as well.
pub struct PlaceholderResolver<'a> {
    source: &'a dyn ItemDataSource,
    item: String,
    names: Option<Result<LocalizedNames, String>>,
    description: Option<Result<String, String>>,
    materials: Option<Result<String, String>>,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(source: &'a dyn ItemDataSource, item_identifier: &str) -> Self {
        Self {
            source,
            item: item_identifier.trim().to_owned(),
            names: None,
            description: None,
            materials: None,
        }
    }

    pub fn item_identifier(&self) -> &str {
        &self.item
    }

    /// Substitute every recognized token in `text`.
    ///
    /// Returns `text` unchanged when the identifier is empty. Unknown `{...}` tokens are kept.
    pub fn resolve(&mut self, text: &str) -> String {
        if self.item.is_empty() {
            return text.to_owned();
        }
        replace_tokens(text, |name| {
            let token = Token::parse(name)?;
            Some(self.value_for(token))
        })
    }

    fn value_for(&mut self, token: Token) -> String {
        let looked_up = match token {
            Token::Indeks => return self.item.clone(),
            Token::NazwaPl => self.names().map(|n| n.pl.clone()),
            Token::NazwaEn => self.names().map(|n| n.en.clone()),
            Token::Opis => {
                let (source, item) = (self.source, self.item.as_str());
                self.description
                    .get_or_insert_with(|| source.description(item).map_err(|e| e.to_string()))
                    .clone()
            }
            Token::Materialy => {
                let (source, item) = (self.source, self.item.as_str());
                self.materials
                    .get_or_insert_with(|| source.materials(item).map_err(|e| e.to_string()))
                    .clone()
            }
        };

        match looked_up {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    token = token.name(),
                    item = %self.item,
                    error = %e,
                    "placeholder lookup failed, substituting diagnostic"
                );
                diagnostic(token)
            }
        }
    }

    fn names(&mut self) -> Result<&LocalizedNames, String> {
        let (source, item) = (self.source, self.item.as_str());
        self.names
            .get_or_insert_with(|| source.names(item).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(Clone::clone)
    }
}

/// One-shot resolution; use [`PlaceholderResolver`] to share lookups across many texts.
pub fn resolve(source: &dyn ItemDataSource, text: &str, item_identifier: &str) -> String {
    PlaceholderResolver::new(source, item_identifier).resolve(text)
}

/// `true` when `text` contains at least one `{IDENTIFIER}`-shaped token, recognized or not.
pub fn contains_token(text: &str) -> bool {
    let mut found = false;
    let _ = replace_tokens(text, |_| {
        found = true;
        None
    });
    found
}

/// Rebuild `text`, asking `f` for a replacement for every `{IDENTIFIER}` occurrence.
///
/// `f` receives the name between the braces; `None` keeps the token verbatim. Braces that do not
/// enclose an identifier (`[A-Za-z0-9_]+`) are literal text.
fn replace_tokens(text: &str, mut f: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let closed = after[name_len..].starts_with('}');

        if name_len > 0 && closed {
            let name = &after[..name_len];
            match f(name) {
                Some(v) => out.push_str(&v),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[name_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}
