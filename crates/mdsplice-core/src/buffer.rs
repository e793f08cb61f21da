//! Growable output buffer that never truncates.
//!
//! Every append reserves room for the whole slice before writing, so an
//! append either lands completely or fails without touching the buffer.
//! Growth is delegated to [`String::try_reserve`], which is amortized
//! (geometric) like ordinary pushes.

use crate::error::BufferError;

/// Output buffer owned by a single pipeline stage.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: String,
    limit: Option<usize>,
}

impl OutputBuffer {
    /// Create a buffer sized for an input of `hint` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] if the initial reservation fails.
    pub fn for_input(hint: usize, limit: Option<usize>) -> Result<Self, BufferError> {
        let mut buffer = Self {
            buf: String::new(),
            limit,
        };
        let initial = limit.map_or(hint, |l| hint.min(l));
        buffer.reserve(initial)?;
        Ok(buffer)
    }

    fn reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        let needed = self.buf.len() + additional;
        if let Some(limit) = self.limit
            && needed > limit
        {
            return Err(BufferError::LimitExceeded { limit, needed });
        }
        self.buf
            .try_reserve(additional)
            .map_err(|source| BufferError::Alloc {
                requested: additional,
                source,
            })
    }

    /// Append a string slice.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] without modifying the buffer if the slice
    /// does not fit.
    pub fn push_str(&mut self, s: &str) -> Result<(), BufferError> {
        self.reserve(s.len())?;
        self.buf.push_str(s);
        Ok(())
    }

    /// Append a single character (up to four bytes).
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] without modifying the buffer if it does not fit.
    pub fn push(&mut self, c: char) -> Result<(), BufferError> {
        self.reserve(c.len_utf8())?;
        self.buf.push(c);
        Ok(())
    }

    /// Append several slices as one unit.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] without modifying the buffer if the combined
    /// length does not fit.
    pub fn push_all(&mut self, parts: &[&str]) -> Result<(), BufferError> {
        self.reserve(parts.iter().map(|p| p.len()).sum())?;
        for part in parts {
            self.buf.push_str(part);
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.buf
    }
}
