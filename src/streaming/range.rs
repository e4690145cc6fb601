//! HTTP Range resolution against a known object size.

/// Inclusive byte interval within an object.
///
/// Invariant: `0 <= from <= until < size` of the object it was resolved
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteInterval {
    pub from: u64,
    pub until: u64,
}

impl ByteInterval {
    /// Number of bytes the interval covers. Never zero.
    pub fn byte_len(&self) -> u64 {
        self.until - self.from + 1
    }
}

/// Outcome of range resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub interval: ByteInterval,
    /// Whether the request carried a `Range` header at all. Controls
    /// whether `Content-Range` is emitted on a 200.
    pub had_header: bool,
}

impl ResolvedRange {
    /// Whether the interval is a proper sub-range of the object, which
    /// makes the response a 206 rather than a 200.
    pub fn is_partial(&self, size: u64) -> bool {
        self.interval.from != 0 || self.interval.until != size - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Callers translate this into a 416 with
    /// `Content-Range: bytes */{size}` and no body.
    #[error("range not satisfiable for object of {size} bytes")]
    Unsatisfiable { size: u64 },
}

/// Resolve a `Range` header (or its absence) against the object size.
///
/// Only the `bytes=start-[end]` form is accepted: `start` is required and
/// `end` defaults to the last byte. Suffix ranges, multiple ranges, and
/// anything unparseable are rejected the same way as out-of-bounds ones.
pub fn resolve(header: Option<&str>, size: u64) -> Result<ResolvedRange, RangeError> {
    let unsatisfiable = RangeError::Unsatisfiable { size };
    if size == 0 {
        return Err(unsatisfiable);
    }

    let Some(header) = header else {
        return Ok(ResolvedRange {
            interval: ByteInterval {
                from: 0,
                until: size - 1,
            },
            had_header: false,
        });
    };

    let byte_range = header.strip_prefix("bytes=").ok_or(unsatisfiable)?;
    let (start, end) = byte_range.split_once('-').ok_or(unsatisfiable)?;

    let from: u64 = start.trim().parse().map_err(|_| unsatisfiable)?;
    let until: u64 = match end.trim() {
        "" => size - 1,
        explicit => explicit.parse().map_err(|_| unsatisfiable)?,
    };

    if until > size - 1 || until < from {
        return Err(unsatisfiable);
    }
    // Clamp stays in place behind the boundary check above.
    let until = until.min(size - 1);

    Ok(ResolvedRange {
        interval: ByteInterval { from, until },
        had_header: true,
    })
}
