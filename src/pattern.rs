//! Shell-style wildcard expansion for `mget`, `mdelete` and `mput`.

use std::{
    fs,
    path::Path,
};

use crate::model::fs::FSError;

#[derive(Debug, PartialEq)]
enum Token {
    Star,
    Any,
    Literal(char),
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // consecutive stars match the same as one
                if tokens.last() != Some(&Token::Star) {
                    tokens.push(Token::Star);
                }
                i += 1;
            }
            '?' => {
                tokens.push(Token::Any);
                i += 1;
            }
            '[' => match parse_class(&chars, i + 1) {
                Some((token, next)) => {
                    tokens.push(token);
                    i = next;
                }
                None => {
                    tokens.push(Token::Literal('['));
                    i += 1;
                }
            },
            c => {
                tokens.push(Token::Literal(c));
                i += 1;
            }
        }
    }

    tokens
}

/// Parses a `[...]` class whose body starts at `start`. Returns `None`
/// when the class is never closed, in which case `[` is literal.
fn parse_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start;
    // only `!` negates; a leading `^` is an ordinary member
    let negated = chars.get(i) == Some(&'!');
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    let mut first = true;
    loop {
        let c = *chars.get(i)?;
        if c == ']' && !first {
            return Some((Token::Class { negated, ranges }, i + 1));
        }
        first = false;

        if chars.get(i + 1) == Some(&'-') && matches!(chars.get(i + 2), Some(&end) if end != ']') {
            ranges.push((c, chars[i + 2]));
            i += 3;
        } else {
            ranges.push((c, c));
            i += 1;
        }
    }
}

fn token_matches(token: &Token, c: char) -> bool {
    match token {
        Token::Star | Token::Any => true,
        Token::Literal(l) => *l == c,
        Token::Class { negated, ranges } => {
            let hit = ranges.iter().any(|(lo, hi)| *lo <= c && c <= *hi);
            hit != *negated
        }
    }
}

/// Matches `name` against a shell wildcard pattern. `*` also matches `/`.
pub fn glob_match(name: &str, pattern: &str) -> bool {
    let tokens = tokenize(pattern);
    let chars: Vec<char> = name.chars().collect();

    let (mut t, mut c) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while c < chars.len() {
        match tokens.get(t) {
            Some(Token::Star) => {
                backtrack = Some((t, c));
                t += 1;
            }
            Some(token) if token_matches(token, chars[c]) => {
                t += 1;
                c += 1;
            }
            _ => match backtrack {
                Some((star_t, star_c)) => {
                    t = star_t + 1;
                    c = star_c + 1;
                    backtrack = Some((star_t, star_c + 1));
                }
                None => return false,
            },
        }
    }

    tokens[t..].iter().all(|token| *token == Token::Star)
}

pub fn contains_glob(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Matches every pattern against `listing`, grouping results by pattern.
/// Entries matched by several patterns appear once per pattern.
pub fn expand(patterns: &[String], listing: &[String]) -> Vec<String> {
    let mut matches = Vec::new();
    for pattern in patterns {
        for entry in listing {
            if glob_match(entry, pattern) {
                matches.push(entry.clone());
            }
        }
    }

    matches
}

/// Expands patterns against the local filesystem under `base`.
///
/// Each `/`-separated segment of a pattern is matched against directory
/// entries, so `data/*.csv` walks one level. Results keep the pattern's
/// spelling (relative patterns yield relative paths) and are sorted per
/// directory. Hidden entries only match segments starting with `.`.
pub fn expand_local(patterns: &[String], base: &Path) -> Result<Vec<String>, FSError> {
    let mut matches = Vec::new();
    for pattern in patterns {
        let absolute = pattern.starts_with('/');
        let mut found: Vec<String> = vec![if absolute { "/".to_string() } else { String::new() }];

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            let mut next = Vec::new();
            for prefix in &found {
                let dir = if prefix.is_empty() {
                    base.to_path_buf()
                } else {
                    base.join(prefix)
                };

                if !contains_glob(segment) {
                    let candidate = join_display(prefix, segment);
                    if base.join(&candidate).exists() {
                        next.push(candidate);
                    }
                    continue;
                }

                for name in read_dir_names(&dir)? {
                    if name.starts_with('.') && !segment.starts_with('.') {
                        continue;
                    }
                    if glob_match(&name, segment) {
                        next.push(join_display(prefix, &name));
                    }
                }
            }
            found = next;
        }

        matches.extend(found.into_iter().filter(|f| !f.is_empty() && f != "/"));
    }

    Ok(matches)
}

fn join_display(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('/') {
        format!("{}{}", prefix, name)
    } else {
        format!("{}/{}", prefix, name)
    }
}

fn read_dir_names(dir: &Path) -> Result<Vec<String>, FSError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|err| FSError::local_io(dir, err))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| FSError::local_io(dir, err))?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    names.sort();

    Ok(names)
}
