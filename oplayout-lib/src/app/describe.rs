use std::sync::Arc;

use thiserror::Error;

use crate::{
    class::{
        member::{MemberDef, MemberFlags, MemberType},
        registry::ClassRegistry,
        ClassDescriptor, ClassSpec,
    },
    error::LayoutError,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescribeError {
    #[error("line {line}: unknown directive `{directive}`")]
    UnknownDirective { line: usize, directive: String },
    #[error("line {line}: expected {expected}")]
    MissingToken { line: usize, expected: &'static str },
    #[error("line {line}: invalid `{token}`")]
    InvalidToken { line: usize, token: String },
    #[error("line {line}: member outside of a class")]
    MemberOutsideClass { line: usize },
    #[error("line {line}: unknown base class `{name}`")]
    UnknownBase { line: usize, name: String },
    #[error("line {line}: {source}")]
    Layout {
        line: usize,
        #[source]
        source: LayoutError,
    },
}

/// A `class` directive and the `member` directives following it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDraft {
    pub line: usize,
    pub name: String,
    pub base: Option<String>,
    pub extra_size: isize,
    pub item_size: isize,
    pub items_at_end: bool,
    pub members: Vec<MemberDef>,
}

fn invalid(line: usize, token: &str) -> DescribeError {
    DescribeError::InvalidToken {
        line,
        token: token.to_string(),
    }
}

fn parse_class<'a>(line: usize, mut tokens: impl Iterator<Item = &'a str>) -> Result<ClassDraft, DescribeError> {
    let name = tokens.next().ok_or(DescribeError::MissingToken {
        line,
        expected: "class name",
    })?;
    let mut draft = ClassDraft {
        line,
        name: name.to_string(),
        base: None,
        extra_size: 0,
        item_size: 0,
        items_at_end: false,
        members: Vec::new(),
    };
    let mut tokens = tokens.peekable();
    if tokens.next_if_eq(&":").is_some() {
        let base = tokens.next().ok_or(DescribeError::MissingToken {
            line,
            expected: "base class name",
        })?;
        draft.base = Some(base.to_string());
    }
    for token in tokens {
        if token == "items_at_end" {
            draft.items_at_end = true;
        } else if let Some(v) = token.strip_prefix("size=") {
            draft.extra_size = v.parse().map_err(|_| invalid(line, token))?;
        } else if let Some(v) = token.strip_prefix("items=") {
            draft.item_size = v.parse().map_err(|_| invalid(line, token))?;
        } else {
            return Err(invalid(line, token));
        }
    }
    Ok(draft)
}

fn parse_member<'a>(line: usize, mut tokens: impl Iterator<Item = &'a str>) -> Result<MemberDef, DescribeError> {
    let name = tokens.next().ok_or(DescribeError::MissingToken {
        line,
        expected: "member name",
    })?;
    let type_ = tokens.next().ok_or(DescribeError::MissingToken {
        line,
        expected: "member type",
    })?;
    let type_ = MemberType::from_name(type_).ok_or_else(|| invalid(line, type_))?;
    let offset = tokens.next().ok_or(DescribeError::MissingToken {
        line,
        expected: "member offset",
    })?;
    let offset = offset
        .strip_prefix('@')
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| invalid(line, offset))?;
    let mut member = MemberDef::new(name, type_, offset);
    for token in tokens {
        member = member.with_flags(match token {
            "relative" => MemberFlags::RELATIVE_OFFSET,
            "readonly" => MemberFlags::READONLY,
            _ => return Err(invalid(line, token)),
        });
    }
    Ok(member)
}

pub fn parse(text: &str) -> Result<Vec<ClassDraft>, DescribeError> {
    let mut result: Vec<ClassDraft> = Vec::new();
    for (i, source) in text.lines().enumerate() {
        let line = i + 1;
        let content = source.split('#').next().unwrap_or_default();
        let mut tokens = content.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        match directive {
            "class" => result.push(parse_class(line, tokens)?),
            "member" => {
                let member = parse_member(line, tokens)?;
                result
                    .last_mut()
                    .ok_or(DescribeError::MemberOutsideClass { line })?
                    .members
                    .push(member);
            }
            _ => {
                return Err(DescribeError::UnknownDirective {
                    line,
                    directive: directive.to_string(),
                })
            }
        }
    }
    Ok(result)
}

/// Creates the drafted classes in order. A base must be created before its subclasses.
pub fn build(drafts: &[ClassDraft], registry: &ClassRegistry) -> Result<Vec<Arc<ClassDescriptor>>, DescribeError> {
    drafts
        .iter()
        .map(|draft| {
            let mut spec = ClassSpec::new(draft.name.clone())
                .extra_size(draft.extra_size)
                .item_size(draft.item_size);
            if draft.items_at_end {
                spec = spec.items_at_end();
            }
            if let Some(name) = &draft.base {
                let base = registry.get(name).ok_or_else(|| DescribeError::UnknownBase {
                    line: draft.line,
                    name: name.clone(),
                })?;
                spec = spec.base(&base);
            }
            spec.members = draft.members.clone();
            registry.create(spec).map_err(|source| DescribeError::Layout {
                line: draft.line,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use wasm_bindgen_test::wasm_bindgen_test;

    use crate::{
        class::{member::MemberType, registry::ClassRegistry},
        error::{LayoutError, RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE},
    };

    use super::{build, parse, DescribeError};

    #[test]
    #[wasm_bindgen_test]
    fn test_parse() {
        let drafts = parse(
            "# comment\n\
             class Base size=32 items=8 items_at_end\n\
             \n\
             class Sub : Base size=-16 # trailing\n\
             member a i64 @0 relative readonly\n",
        )
        .unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].name, "Base");
        assert_eq!(drafts[0].extra_size, 32);
        assert_eq!(drafts[0].item_size, 8);
        assert!(drafts[0].items_at_end);
        assert_eq!(drafts[1].line, 4);
        assert_eq!(drafts[1].base.as_deref(), Some("Base"));
        assert_eq!(drafts[1].extra_size, -16);
        let m = &drafts[1].members[0];
        assert_eq!(m.name, "a");
        assert_eq!(m.type_, MemberType::I64);
        assert_eq!(m.offset, 0);
        assert!(m.is_relative());
        assert!(m.is_readonly());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_parse_errors() {
        assert_eq!(
            parse("struct A"),
            Err(DescribeError::UnknownDirective {
                line: 1,
                directive: "struct".into()
            })
        );
        assert_eq!(
            parse("member a i32 @0"),
            Err(DescribeError::MemberOutsideClass { line: 1 })
        );
        assert_eq!(
            parse("class"),
            Err(DescribeError::MissingToken {
                line: 1,
                expected: "class name"
            })
        );
        assert_eq!(
            parse("class A size=x"),
            Err(DescribeError::InvalidToken {
                line: 1,
                token: "size=x".into()
            })
        );
        assert_eq!(
            parse("class A\nmember a str @0"),
            Err(DescribeError::InvalidToken {
                line: 2,
                token: "str".into()
            })
        );
        assert_eq!(
            parse("class A\nmember a i32 0"),
            Err(DescribeError::InvalidToken {
                line: 2,
                token: "0".into()
            })
        );
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_build_errors() {
        let registry = ClassRegistry::new();
        let drafts = parse("class A : Missing size=-8").unwrap();
        assert_eq!(
            build(&drafts, &registry).unwrap_err(),
            DescribeError::UnknownBase {
                line: 1,
                name: "Missing".into()
            }
        );
        let drafts = parse("class A size=32\nclass B : A size=40\nmember a i32 @0 relative").unwrap();
        let e = build(&drafts, &registry).unwrap_err();
        assert_eq!(
            e,
            DescribeError::Layout {
                line: 2,
                source: LayoutError::RelativeOffsetMisuse(RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE)
            }
        );
        assert_eq!(e.to_string(), "line 2: relative offset without relative size");
        assert!(registry.contains("A"));
        assert!(!registry.contains("B"));
    }
}
