use crate::Ptr;
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::{Deref, Range},
};

/// The String type used by the Quill runtime
///
/// The underlying string data is shared between instances, with internal
/// bounds allowing for shared subslices. Indexing is code-point based
/// throughout: [QString::char_slice] and [QString::char_at] both count
/// Unicode scalar values rather than bytes.
#[derive(Clone)]
pub struct QString(Inner);

// Either the full string, or a slice
//
// By heap-allocating slice bounds we keep QString's size down to 16 bytes.
#[derive(Clone)]
enum Inner {
    Full(Ptr<str>),
    Slice(Ptr<StringSlice>),
}

#[derive(Clone)]
struct StringSlice {
    data: Ptr<str>,
    bounds: Range<usize>,
}

impl StringSlice {
    // Bounds are byte offsets into `data`, and must lie on char boundaries
    fn new(data: Ptr<str>, bounds: Range<usize>) -> Option<Self> {
        data.get(bounds.clone())?;
        Some(Self { data, bounds })
    }

    fn as_str(&self) -> &str {
        &self.data[self.bounds.clone()]
    }
}

impl QString {
    /// Returns the empty string
    pub fn empty() -> Self {
        Self::from("")
    }

    /// Returns the `&str` within the QString's bounds
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Inner::Full(string) => string,
            Inner::Slice(slice) => slice.as_str(),
        }
    }

    /// Returns a new QString with shared data and new bounds
    ///
    /// The bounds are byte offsets relative to this string's view. If they
    /// aren't valid for the data then `None` is returned.
    pub fn with_bounds(&self, bounds: Range<usize>) -> Option<Self> {
        let (data, start) = match &self.0 {
            Inner::Full(string) => (string.clone(), 0),
            Inner::Slice(slice) => (slice.data.clone(), slice.bounds.start),
        };

        StringSlice::new(data, (start + bounds.start)..(start + bounds.end)).map(Self::from)
    }

    /// Returns a new QString with shared data and bounds defined by code-point indices
    ///
    /// Indices at or past the end of the string resolve to the end, so
    /// callers can clamp indices against [QString::char_count] freely.
    pub fn char_slice(&self, indices: Range<usize>) -> Self {
        if indices.start >= indices.end {
            return Self::empty();
        }

        let start = self.char_boundary(indices.start);
        let end = self.char_boundary(indices.end);
        self.with_bounds(start..end).unwrap_or_else(Self::empty)
    }

    /// Returns the code point at the given index
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.as_str().chars().nth(index)
    }

    /// Returns the number of code points contained within the QString's bounds
    pub fn char_count(&self) -> usize {
        self.as_str().chars().count()
    }

    // Returns the byte offset of the given code-point index, clamped to the
    // end of the view
    fn char_boundary(&self, char_index: usize) -> usize {
        let s = self.as_str();
        s.char_indices()
            .nth(char_index)
            .map_or(s.len(), |(offset, _)| offset)
    }
}

impl PartialEq<&str> for QString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq for QString {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for QString {}

impl Hash for QString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl Deref for QString {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for QString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::borrow::Borrow<str> for QString {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<Ptr<str>> for QString {
    fn from(string: Ptr<str>) -> Self {
        Self(Inner::Full(string))
    }
}

impl From<StringSlice> for QString {
    fn from(slice: StringSlice) -> Self {
        Self(Inner::Slice(slice.into()))
    }
}

impl From<String> for QString {
    fn from(s: String) -> Self {
        Self::from(Ptr::<str>::from(s.into_boxed_str()))
    }
}

impl From<&str> for QString {
    fn from(s: &str) -> Self {
        Self::from(Ptr::<str>::from(s))
    }
}

impl fmt::Display for QString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for QString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
