//! Page-range planning: turn a user page specification into an ordered plan.
//!
//! The syntax is the one `djvutxt --page` understands: one or more
//! comma-separated tokens, each a page number (`5`) or two page numbers
//! separated by a dash (`1-10`). A descending range (`99-4`) yields its pages
//! in reverse order, and tokens are simply concatenated, so the same page may
//! appear several times and in any order the user asks for.
//!
//! Because pdftotext only understands a single contiguous `-f/-l` window, the
//! dispatcher walks the plan page by page and stitches the results together
//! in plan order.

use crate::error::Doc2TxtError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound on the number of pages a single plan may expand to.
pub const MAX_PLAN_PAGES: usize = 100_000;

static RE_PAGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").unwrap());

/// An ordered list of 1-indexed pages to extract.
///
/// Invariant: never empty and every page is ≥ 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlan {
    spec: String,
    pages: Vec<u32>,
}

impl PagePlan {
    /// Parse a page specification such as `"1,3,5-3"`.
    ///
    /// Fails on the first malformed token; nothing is extracted before the
    /// whole specification has been validated.
    pub fn parse(spec: &str) -> Result<Self, Doc2TxtError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(invalid(spec, "the specification is empty"));
        }

        let mut ranges = Vec::new();
        let mut total = 0u64;
        for token in trimmed.split(',') {
            let (first, last) = parse_token(spec, token)?;
            total += u64::from(first.abs_diff(last)) + 1;
            if total > MAX_PLAN_PAGES as u64 {
                return Err(invalid(
                    spec,
                    &format!("the plan covers more than {MAX_PLAN_PAGES} pages"),
                ));
            }
            ranges.push((first, last));
        }

        let mut pages = Vec::with_capacity(total as usize);
        for &(first, last) in &ranges {
            if first <= last {
                pages.extend(first..=last);
            } else {
                pages.extend((last..=first).rev());
            }
        }

        let spec = ranges
            .iter()
            .map(|&(first, last)| {
                if first == last {
                    first.to_string()
                } else {
                    format!("{first}-{last}")
                }
            })
            .collect::<Vec<_>>()
            .join(",");

        Ok(Self { spec, pages })
    }

    /// Parse an optional specification; `None` or a blank string means "all pages".
    pub fn parse_optional(spec: Option<&str>) -> Result<Option<Self>, Doc2TxtError> {
        match spec {
            Some(s) if !s.trim().is_empty() => Self::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    /// The pages in extraction order.
    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    /// The specification in canonical form (`N` or `A-B` tokens joined by
    /// commas, no whitespace), forwarded to tools that accept the same syntax.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PagePlan {
    type Err = Doc2TxtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PagePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Parse one token into its `(first, last)` bounds; a single page is `(n, n)`.
fn parse_token(spec: &str, token: &str) -> Result<(u32, u32), Doc2TxtError> {
    let caps = RE_PAGE_TOKEN.captures(token).ok_or_else(|| {
        if token.trim().is_empty() {
            invalid(spec, "empty page range")
        } else {
            invalid(spec, &format!("'{}' is not a page number or range", token.trim()))
        }
    })?;

    let first = parse_page(spec, &caps[1])?;
    let last = match caps.get(2) {
        None => first,
        Some(last) => parse_page(spec, last.as_str())?,
    };
    Ok((first, last))
}

fn parse_page(spec: &str, digits: &str) -> Result<u32, Doc2TxtError> {
    let page: u32 = digits
        .parse()
        .map_err(|_| invalid(spec, &format!("page number '{digits}' is too large")))?;
    if page == 0 {
        return Err(invalid(spec, "pages are 1-indexed, minimum is 1"));
    }
    Ok(page)
}

fn invalid(spec: &str, reason: &str) -> Doc2TxtError {
    Doc2TxtError::InvalidPageSpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    }
}
