// Rule annotation parser
//
// Grammar:
//   annotation = [ rule { "," rule } ]
//   rule       = name [ "(" [ arg { "," arg } ] ")" ]
//   name       = [A-Za-z_] [A-Za-z0-9_]*
//   arg        = any characters except "(", ")" and ",", trimmed

use crate::ParseError;
use serde::Serialize;
use std::fmt;
use std::mem;

/// A single rule mentioned in a field annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInvocation {
    /// Registry name of the validator
    pub name: String,

    /// Arguments in written order
    pub arguments: Vec<String>,
}

impl RuleInvocation {
    pub fn new(name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Get an argument by position
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }
}

impl fmt::Display for RuleInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.arguments.join(","))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ExpectName,
    InName,
    AfterName,
    InArgs,
    AfterArgs,
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Parse a rule annotation into rule invocations, in written order.
///
/// An empty or blank annotation yields no rules.
///
/// ```
/// use ruleval_core::parse;
///
/// let rules = parse("not_empty, min(2), max(10)").unwrap();
/// assert_eq!(rules.len(), 3);
/// assert_eq!(rules[1].name, "min");
/// assert_eq!(rules[1].arguments, vec!["2".to_string()]);
///
/// assert!(parse("").unwrap().is_empty());
/// assert!(parse("min(2").is_err());
/// ```
pub fn parse(raw: &str) -> Result<Vec<RuleInvocation>, ParseError> {
    let mut rules = Vec::new();

    if raw.trim().is_empty() {
        return Ok(rules);
    }

    let annotation = || raw.to_string();

    let mut state = State::ExpectName;
    let mut name = String::new();
    let mut arguments = Vec::new();
    let mut argument = String::new();
    let mut opened_at = 0;

    for (position, ch) in raw.char_indices() {
        state = match state {
            State::ExpectName => match ch {
                c if c.is_whitespace() => State::ExpectName,
                c if is_name_start(c) => {
                    name.push(c);
                    State::InName
                }
                ',' => {
                    return Err(ParseError::EmptyRule {
                        annotation: annotation(),
                        position,
                    });
                }
                ')' => {
                    return Err(ParseError::UnexpectedCloseParen {
                        annotation: annotation(),
                        position,
                    });
                }
                c => {
                    return Err(ParseError::UnexpectedChar {
                        annotation: annotation(),
                        position,
                        ch: c,
                    });
                }
            },
            State::InName => match ch {
                c if is_name_char(c) => {
                    name.push(c);
                    State::InName
                }
                c if c.is_whitespace() => State::AfterName,
                '(' => {
                    opened_at = position;
                    State::InArgs
                }
                ',' => {
                    finish(&mut rules, &mut name, &mut arguments);
                    State::ExpectName
                }
                ')' => {
                    return Err(ParseError::UnexpectedCloseParen {
                        annotation: annotation(),
                        position,
                    });
                }
                c => {
                    return Err(ParseError::UnexpectedChar {
                        annotation: annotation(),
                        position,
                        ch: c,
                    });
                }
            },
            State::AfterName => match ch {
                c if c.is_whitespace() => State::AfterName,
                '(' => {
                    opened_at = position;
                    State::InArgs
                }
                ',' => {
                    finish(&mut rules, &mut name, &mut arguments);
                    State::ExpectName
                }
                ')' => {
                    return Err(ParseError::UnexpectedCloseParen {
                        annotation: annotation(),
                        position,
                    });
                }
                c if is_name_char(c) => {
                    return Err(ParseError::MissingDelimiter {
                        annotation: annotation(),
                        position,
                    });
                }
                c => {
                    return Err(ParseError::UnexpectedChar {
                        annotation: annotation(),
                        position,
                        ch: c,
                    });
                }
            },
            State::InArgs => match ch {
                '(' => {
                    return Err(ParseError::NestedParen {
                        annotation: annotation(),
                        position,
                    });
                }
                ',' => {
                    push_argument(&mut arguments, &mut argument).ok_or_else(|| {
                        ParseError::EmptyArgument {
                            annotation: annotation(),
                            position,
                        }
                    })?;
                    State::InArgs
                }
                ')' => {
                    // `name()` is an explicit empty argument list
                    if arguments.is_empty() && argument.trim().is_empty() {
                        argument.clear();
                    } else {
                        push_argument(&mut arguments, &mut argument).ok_or_else(|| {
                            ParseError::EmptyArgument {
                                annotation: annotation(),
                                position,
                            }
                        })?;
                    }
                    State::AfterArgs
                }
                c => {
                    argument.push(c);
                    State::InArgs
                }
            },
            State::AfterArgs => match ch {
                c if c.is_whitespace() => State::AfterArgs,
                ',' => {
                    finish(&mut rules, &mut name, &mut arguments);
                    State::ExpectName
                }
                ')' => {
                    return Err(ParseError::UnexpectedCloseParen {
                        annotation: annotation(),
                        position,
                    });
                }
                '(' => {
                    return Err(ParseError::UnexpectedChar {
                        annotation: annotation(),
                        position,
                        ch: '(',
                    });
                }
                _ => {
                    return Err(ParseError::MissingDelimiter {
                        annotation: annotation(),
                        position,
                    });
                }
            },
        };
    }

    match state {
        State::ExpectName => Err(ParseError::EmptyRule {
            annotation: annotation(),
            position: raw.len(),
        }),
        State::InArgs => Err(ParseError::UnclosedArguments {
            annotation: annotation(),
            position: opened_at,
        }),
        State::InName | State::AfterName | State::AfterArgs => {
            finish(&mut rules, &mut name, &mut arguments);
            Ok(rules)
        }
    }
}

fn finish(rules: &mut Vec<RuleInvocation>, name: &mut String, arguments: &mut Vec<String>) {
    rules.push(RuleInvocation {
        name: mem::take(name),
        arguments: mem::take(arguments),
    });
}

fn push_argument(arguments: &mut Vec<String>, argument: &mut String) -> Option<()> {
    let trimmed = argument.trim();
    if trimmed.is_empty() {
        return None;
    }
    arguments.push(trimmed.to_string());
    argument.clear();
    Some(())
}
