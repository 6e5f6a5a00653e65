// crates/logging/src/pattern.rs

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{HandlerError, Result};

/// Directories substituted for `%t` and `%h` when a pattern is expanded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathEnv {
    temp_dir: PathBuf,
    home_dir: Option<PathBuf>,
}

impl PathEnv {
    /// Resolve the platform temp directory, falling back to the user's
    /// home directory when the temp directory is unusable.
    pub fn from_system() -> Self {
        let home_dir = dirs::home_dir();
        let tmp = std::env::temp_dir();
        let temp_dir = if tmp.is_dir() {
            tmp
        } else {
            match &home_dir {
                Some(home) => {
                    tracing::debug!(
                        temp = %tmp.display(),
                        home = %home.display(),
                        "temp directory unavailable, using home directory"
                    );
                    home.clone()
                }
                None => tmp,
            }
        };
        Self { temp_dir, home_dir }
    }

    pub fn with_temp_dir(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            home_dir: dirs::home_dir(),
        }
    }

    pub fn home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Lit(String),
    Sep,
    Temp,
    Home,
    Generation,
    Unique,
}

/// A log file name pattern.
///
/// `%t` is the temp directory, `%h` the home directory, `%g` the
/// generation and `%u` the unique number used to resolve lock conflicts.
/// `%%` is a literal percent sign and `/` separates components on every
/// platform. Unknown `%` sequences are kept as written.
#[derive(Clone, PartialEq, Eq)]
pub struct LogPattern {
    source: String,
    tokens: Vec<Token>,
}

impl LogPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(HandlerError::EmptyPattern);
        }
        Ok(Self {
            source: pattern.to_string(),
            tokens: parse_tokens(pattern),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn has_generation(&self) -> bool {
        self.tokens.contains(&Token::Generation)
    }

    pub fn has_unique(&self) -> bool {
        self.tokens.contains(&Token::Unique)
    }

    /// Expand the pattern into a concrete path.
    ///
    /// When rotation is in use (`count > 1`) and the pattern has no `%g`,
    /// `.<generation>` is appended. A non-zero `unique` without `%u` is
    /// appended the same way, after the generation.
    pub fn expand(&self, generation: u32, unique: u32, count: u32, env: &PathEnv) -> Result<PathBuf> {
        let mut path = PathBuf::new();
        let mut word = OsString::new();
        for token in &self.tokens {
            match token {
                Token::Lit(s) => word.push(s),
                Token::Sep => {
                    if word.is_empty() && path.as_os_str().is_empty() {
                        path.push(std::path::MAIN_SEPARATOR_STR);
                    } else if !word.is_empty() {
                        path.push(&word);
                        word.clear();
                    }
                }
                Token::Temp => word.push(env.temp_dir.as_os_str()),
                Token::Home => match &env.home_dir {
                    Some(home) => word.push(home.as_os_str()),
                    None => {
                        return Err(HandlerError::NoHomeDir {
                            pattern: self.source.clone(),
                        });
                    }
                },
                Token::Generation => word.push(generation.to_string()),
                Token::Unique => word.push(unique.to_string()),
            }
        }
        if count > 1 && !self.has_generation() {
            word.push(format!(".{generation}"));
        }
        if unique > 0 && !self.has_unique() {
            word.push(format!(".{unique}"));
        }
        if !word.is_empty() {
            path.push(&word);
        }
        Ok(path)
    }
}

impl fmt::Debug for LogPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LogPattern").field(&self.source).finish()
    }
}

impl fmt::Display for LogPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || std::path::is_separator(c)
}

fn parse_tokens(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    let mut lit = String::new();
    while let Some(c) = chars.next() {
        if c == '%' {
            let token = match chars.next() {
                Some('t') => Token::Temp,
                Some('h') => Token::Home,
                Some('g') => Token::Generation,
                Some('u') => Token::Unique,
                Some('%') => {
                    lit.push('%');
                    continue;
                }
                Some(other) if is_separator(other) => {
                    lit.push('%');
                    tokens.push(Token::Lit(std::mem::take(&mut lit)));
                    tokens.push(Token::Sep);
                    continue;
                }
                Some(other) => {
                    lit.push('%');
                    lit.push(other);
                    continue;
                }
                None => {
                    lit.push('%');
                    continue;
                }
            };
            if !lit.is_empty() {
                tokens.push(Token::Lit(std::mem::take(&mut lit)));
            }
            tokens.push(token);
        } else if is_separator(c) {
            if !lit.is_empty() {
                tokens.push(Token::Lit(std::mem::take(&mut lit)));
            }
            tokens.push(Token::Sep);
        } else {
            lit.push(c);
        }
    }
    if !lit.is_empty() {
        tokens.push(Token::Lit(lit));
    }
    tokens
}
