// path.rs
use super::instance::{CompoundInstance, Field};
use crate::{Error, Result, schema::Type};
use core::fmt;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Member(String),
    Index(u64),
}

/// A parsed field path: member names separated by `.`, each optionally
/// followed by `[index]` suffixes, e.g. `GGeoSondLoc[3][1][0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |why: &str| Error::InvalidPath(format!("{path:?}: {why}"));
        let mut segments = Vec::new();

        for part in path.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(i) => part.split_at(i),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(invalid("empty member name"));
            }
            if !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(invalid("unexpected character in member name"));
            }
            segments.push(PathSegment::Member(name.to_string()));

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let digits = rest
                    .strip_prefix('[')
                    .map(|r| &r[..close - 1])
                    .ok_or_else(|| invalid("text after ']'"))?;
                let index = digits
                    .parse::<u64>()
                    .map_err(|_| invalid("index is not an unsigned integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk the path from `root`.
    pub fn walk(&self, root: &CompoundInstance) -> Result<Field> {
        let mut segments = self.segments.iter();
        let mut current = match segments.next() {
            Some(PathSegment::Member(name)) => root.field(name)?,
            _ => return Err(Error::InvalidPath(self.to_string())),
        };
        for segment in segments {
            current = match (current, segment) {
                (Field::Compound(c), PathSegment::Member(name)) => c.field(name)?,
                (Field::Sequence(s), PathSegment::Index(i)) => s.element(*i)?,
                _ => {
                    return Err(Error::InvalidPath(format!(
                        "{self}: {segment:?} does not match the decoded structure"
                    )));
                }
            };
        }
        Ok(current)
    }

    /// Static byte offset and type of the path target within `ty`.
    ///
    /// Every member before the target must have a static size, and indexed
    /// sequences must have fixed counts.
    pub fn locate(&self, ty: &Type) -> Result<(u64, Type)> {
        let mut offset = 0u64;
        let mut current = ty.clone();
        for segment in &self.segments {
            let next = match (&current, segment) {
                (Type::Compound(c), PathSegment::Member(name)) => {
                    let (index, member) = c.member(name).ok_or_else(|| Error::NoSuchField {
                        compound: c.name().to_string(),
                        field: name.clone(),
                    })?;
                    for before in &c.members()[..index] {
                        offset += before
                            .ty
                            .size()
                            .ok_or_else(|| Error::UnresolvedSize(before.name.clone()))?;
                    }
                    member.ty.clone()
                }
                (Type::Sequence(s), PathSegment::Index(i)) => {
                    let len = s
                        .fixed_count()
                        .ok_or_else(|| Error::UnresolvedSize(current.describe()))?;
                    if *i >= len {
                        return Err(Error::IndexOutOfRange { index: *i, len });
                    }
                    let size = s
                        .element()
                        .size()
                        .ok_or_else(|| Error::UnresolvedSize(s.element().describe()))?;
                    offset += i * size;
                    s.element().clone()
                }
                _ => {
                    return Err(Error::InvalidPath(format!(
                        "{self}: {segment:?} does not match type {}",
                        current.describe()
                    )));
                }
            };
            current = next;
        }
        Ok((offset, current))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Member(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Member(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
