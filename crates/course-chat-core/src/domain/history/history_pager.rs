// course-chat/course-chat-core
//
// Copyright: 2024, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

use tracing::{debug, warn};

use super::models::{MessagePage, PageCursor, PageLoadError};

/// A page fetch that was handed out by `HistoryPager::begin`. It must be passed back into
/// `HistoryPager::complete` together with the result.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub generation: u64,
    pub before: Option<PageCursor>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    Fetch(PageRequest),
    AlreadyLoading,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageCompletion {
    Accepted(MessagePage),
    Failed(PageLoadError),
    /// The pager was reset after the request was issued.
    Discarded,
}

/// Tracks backward pagination of a single thread.
///
/// At most one fetch is outstanding at any time. Calls to `begin` while a fetch is running
/// collapse into that fetch. Every `reset` bumps the generation so that completions of requests
/// issued before the reset are recognized and dropped.
#[derive(Debug)]
pub struct HistoryPager {
    generation: u64,
    in_flight: Option<PageRequest>,
    has_more: bool,
    last_error: Option<PageLoadError>,
}

impl Default for HistoryPager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryPager {
    pub fn new() -> Self {
        Self::with_generation(0)
    }

    /// Starts counting at `generation`, so that requests of a pager this one replaces are
    /// never mistaken for its own.
    pub fn with_generation(generation: u64) -> Self {
        Self {
            generation,
            in_flight: None,
            has_more: true,
            last_error: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The error of the last failed load. Cleared by the next successful load.
    pub fn last_error(&self) -> Option<&PageLoadError> {
        self.last_error.as_ref()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn begin(&mut self, before: Option<PageCursor>) -> PageFetch {
        if let Some(request) = &self.in_flight {
            if request.before != before {
                debug!("Collapsing page request into the one already running.");
            }
            return PageFetch::AlreadyLoading;
        }

        if !self.has_more {
            return PageFetch::Exhausted;
        }

        let request = PageRequest {
            generation: self.generation,
            before,
        };
        self.in_flight = Some(request.clone());
        PageFetch::Fetch(request)
    }

    pub fn complete(
        &mut self,
        request: &PageRequest,
        result: Result<MessagePage, PageLoadError>,
    ) -> PageCompletion {
        if !self.is_current(request.generation) {
            debug!(
                "Discarding page of generation {} (current {}).",
                request.generation, self.generation
            );
            return PageCompletion::Discarded;
        }

        if self.in_flight.as_ref() == Some(request) {
            self.in_flight = None;
        }

        match result {
            Ok(page) => {
                self.has_more = page.has_more;
                self.last_error = None;
                PageCompletion::Accepted(page)
            }
            Err(err) => {
                warn!("Failed to load history page. {err}");
                self.last_error = Some(err.clone());
                PageCompletion::Failed(err)
            }
        }
    }

    /// Forgets all pagination state and invalidates outstanding requests.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.has_more = true;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::test::MessageBuilder;

    use super::*;

    fn cursor(idx: u32) -> PageCursor {
        PageCursor {
            message_id: format!("msg-{idx}").into(),
            created_at: MessageBuilder::timestamp_for_index(idx),
        }
    }

    #[test]
    fn test_collapses_concurrent_requests() {
        let mut pager = HistoryPager::new();

        let PageFetch::Fetch(request) = pager.begin(Some(cursor(10))) else {
            panic!("Expected a fetch");
        };
        assert_eq!(pager.begin(Some(cursor(10))), PageFetch::AlreadyLoading);

        let page = MessagePage {
            messages: vec![],
            has_more: true,
        };
        assert_eq!(
            pager.complete(&request, Ok(page.clone())),
            PageCompletion::Accepted(page)
        );
        assert!(!pager.is_loading());
    }

    #[test]
    fn test_reports_exhaustion() {
        let mut pager = HistoryPager::new();

        let PageFetch::Fetch(request) = pager.begin(None) else {
            panic!("Expected a fetch");
        };
        pager.complete(
            &request,
            Ok(MessagePage {
                messages: vec![],
                has_more: false,
            }),
        );

        assert_eq!(pager.begin(Some(cursor(1))), PageFetch::Exhausted);
    }

    #[test]
    fn test_discards_completion_after_reset() {
        let mut pager = HistoryPager::new();

        let PageFetch::Fetch(stale) = pager.begin(None) else {
            panic!("Expected a fetch");
        };
        pager.reset();

        let PageFetch::Fetch(current) = pager.begin(None) else {
            panic!("Expected a fetch after reset");
        };

        assert_eq!(
            pager.complete(
                &stale,
                Ok(MessagePage {
                    messages: vec![MessageBuilder::new_with_index(1).build_message()],
                    has_more: false,
                })
            ),
            PageCompletion::Discarded
        );
        // The stale completion must neither end the current load nor touch `has_more`.
        assert!(pager.is_loading());
        assert!(pager.has_more());

        assert!(matches!(
            pager.complete(&current, Err(PageLoadError::Decode { msg: "x".into() })),
            PageCompletion::Failed(_)
        ));
    }

    #[test]
    fn test_failure_keeps_retry_affordance() {
        let mut pager = HistoryPager::new();

        let PageFetch::Fetch(request) = pager.begin(Some(cursor(5))) else {
            panic!("Expected a fetch");
        };
        let err = PageLoadError::Server {
            status: 503,
            msg: "Unavailable".to_string(),
        };
        assert_eq!(
            pager.complete(&request, Err(err.clone())),
            PageCompletion::Failed(err.clone())
        );

        assert_eq!(pager.last_error(), Some(&err));
        assert!(pager.has_more());
        assert_eq!(pager.begin(Some(cursor(5))), PageFetch::Fetch(request));
    }
}
