use tonic::Status;

/// Slice bounds and continuation token for one page of a fully materialized
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBounds {
    /// First index of the page (inclusive).
    pub from: usize,
    /// One past the last index of the page.
    pub to: usize,
    /// Token for the next page; empty when the listing is exhausted.
    pub next_page_token: String,
}

/// Converts an incoming page size and token from an RPC request into slice
/// bounds and the outgoing next-page token.
///
/// Assumes the complete, unpaginated list of items exists as a single slice
/// of `length` items: `items[bounds.from..bounds.to]` is the requested page
/// and `bounds.next_page_token` goes into the response verbatim.
///
/// A token that does not parse as an index fails with
/// [`Status::invalid_argument`]; a token at or past the end yields an empty
/// page with no continuation.
pub fn page_bounds(
    page_size: i32,
    page_token: &str,
    length: usize,
) -> std::result::Result<PageBounds, Status> {
    let mut from = 0;
    let mut to = length;
    let mut next_page_token = String::new();

    if !page_token.is_empty() {
        from = page_token
            .parse::<usize>()
            .map_err(|e| Status::invalid_argument(format!("bad page token: {e}")))?;
        if from >= length {
            return Ok(PageBounds {
                from: length,
                to: length,
                next_page_token,
            });
        }
    }

    if page_size > 0 && from + (page_size as usize) < length {
        to = from + (page_size as usize);
        next_page_token = to.to_string();
    }

    Ok(PageBounds {
        from,
        to,
        next_page_token,
    })
}
