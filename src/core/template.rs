//! # Template Module / 模板模块
//!
//! Renders the name, status, reason and runlength templates against one
//! pattern match. Rendering is a pure function of the template and the match.
//!
//! Placeholders:
//! - `{0}`, `{1}`, ... - capture groups by position (0 is the first group)
//! - `{}` - the next position, counting from 0 (not mixable with `{0}`)
//! - `{name}` - a named capture group
//! - `{{` and `}}` - literal braces
//!
//! A group that did not participate in the match renders as an empty string.
//!
//! 针对一次模式匹配渲染名称、状态、原因和运行时长模板。渲染是模板与匹配结果的纯函数。
//! 未参与匹配的分组渲染为空字符串。

use thiserror::Error;

use crate::core::classifier::MatchRecord;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template refers to unknown group '{0}'")]
    UnknownGroup(String),

    #[error("template refers to group {index} but the pattern has {available} groups")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("unmatched '{brace}' at offset {offset}")]
    UnbalancedBrace { brace: char, offset: usize },

    #[error("format specification in '{{{0}}}' is not supported")]
    UnsupportedSpec(String),

    #[error("cannot switch between automatic and numbered fields at '{{{0}}}'")]
    MixedNumbering(String),
}

/// Renders `template` against `record`.
///
/// # Arguments
/// * `template` - Template text with `{..}` placeholders
/// * `record` - The captures of a single match
///
/// # Returns
/// The rendered string, or the first placeholder problem found.
pub fn render(template: &str, record: &MatchRecord) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    let mut numbering = Numbering::Unset;

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, c)| c == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut field = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(TemplateError::UnbalancedBrace { brace: '{', offset }),
                        _ => field.push(c),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnbalancedBrace { brace: '{', offset });
                }
                out.push_str(lookup(&field, record, &mut numbering)?);
            }
            '}' => {
                if chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(TemplateError::UnbalancedBrace { brace: '}', offset });
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Positional fields are either all automatic or all numbered.
enum Numbering {
    Unset,
    Automatic(usize),
    Manual,
}

fn lookup<'r>(field: &str, record: &'r MatchRecord, numbering: &mut Numbering) -> Result<&'r str, TemplateError> {
    if field.contains([':', '!']) {
        return Err(TemplateError::UnsupportedSpec(field.to_string()));
    }
    if field.is_empty() {
        let index = match *numbering {
            Numbering::Unset => 0,
            Numbering::Automatic(next) => next,
            Numbering::Manual => return Err(TemplateError::MixedNumbering(field.to_string())),
        };
        *numbering = Numbering::Automatic(index + 1);
        return positional(index, record);
    }
    match field.parse::<usize>() {
        Ok(index) => {
            if let Numbering::Automatic(_) = numbering {
                return Err(TemplateError::MixedNumbering(field.to_string()));
            }
            *numbering = Numbering::Manual;
            positional(index, record)
        }
        Err(_) => record
            .named(field)
            .map(|value| value.unwrap_or(""))
            .ok_or_else(|| TemplateError::UnknownGroup(field.to_string())),
    }
}

fn positional(index: usize, record: &MatchRecord) -> Result<&str, TemplateError> {
    record
        .positional(index)
        .map(|value| value.unwrap_or(""))
        .ok_or(TemplateError::IndexOutOfRange {
            index,
            available: record.group_count(),
        })
}
