//! The search panel state machine.
//!
//! `SearchPanel` holds everything the panel shows: whether it is expanded,
//! the query text, the loading flag, the last results and the "nothing found"
//! flag. It performs no I/O. The app feeds it events (focus, text change,
//! debounce fire, fetch settled, close) and renders whatever `view` returns.
//!
//! Each fetch is issued under a [`SearchTicket`] carrying a sequence number.
//! Only the most recently issued ticket may settle; collapsing the panel
//! invalidates every outstanding ticket.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::tvmaze::ShowHit;

/// A fetch the panel wants issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
  pub seq: u64,
  pub query: String,
}

/// What the panel body should display.
#[derive(Debug, PartialEq)]
pub enum PanelView<'a> {
  /// Only the input bar is visible.
  Collapsed,
  Loading,
  /// Nothing searched yet (or results cleared): show the typing prompt.
  Prompt,
  NoResults,
  Results(&'a [ShowHit]),
}

#[derive(Debug, Default)]
pub struct SearchPanel {
  is_expanded: bool,
  query: String,
  is_loading: bool,
  results: Vec<ShowHit>,
  no_findings: bool,
  last_issued: u64,
  /// Sequence number whose response will be applied, if any.
  awaiting: Option<u64>,
}

impl SearchPanel {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_expanded(&self) -> bool {
    self.is_expanded
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn is_loading(&self) -> bool {
    self.is_loading
  }

  pub fn results(&self) -> &[ShowHit] {
    &self.results
  }

  pub fn no_findings(&self) -> bool {
    self.no_findings
  }

  pub fn focus(&mut self) {
    if !self.is_expanded {
      debug!("panel expanded");
    }
    self.is_expanded = true;
  }

  /// Replace the query text. Returns whether it changed.
  ///
  /// An empty or whitespace-only query clears the no-results flag at once.
  pub fn set_query(&mut self, query: impl Into<String>) -> bool {
    let query = query.into();
    if query.trim().is_empty() {
      self.no_findings = false;
    }
    if query == self.query {
      return false;
    }
    self.query = query;
    true
  }

  /// Called when the debounce timer fires. Returns the fetch to issue, or
  /// `None` when the query is blank.
  pub fn begin_search(&mut self) -> Option<SearchTicket> {
    let query = self.query.trim();
    if query.is_empty() {
      return None;
    }
    self.last_issued += 1;
    let seq = self.last_issued;
    self.awaiting = Some(seq);
    self.is_loading = true;
    self.no_findings = false;
    info!(seq, query = %query, "search issued");
    Some(SearchTicket { seq, query: self.query.clone() })
  }

  /// Apply a settled fetch. Returns `false` when the response was stale and
  /// left the state untouched.
  pub fn finish_search(&mut self, seq: u64, outcome: Result<Vec<ShowHit>>) -> bool {
    if self.awaiting != Some(seq) {
      debug!(seq, latest = self.last_issued, "dropping stale search response");
      return false;
    }
    self.awaiting = None;
    self.is_loading = false;

    match outcome {
      Ok(hits) => {
        info!(seq, count = hits.len(), top_score = ?hits.first().map(|h| h.score), "search settled");
        self.no_findings = hits.is_empty() && !self.query.trim().is_empty();
        self.results = hits;
      }
      Err(e) => {
        warn!(seq, err = ?e, "search failed");
      }
    }
    true
  }

  /// Close the panel and reset every field, whatever state it was in.
  pub fn collapse(&mut self) {
    if self.awaiting.is_some() {
      debug!(seq = self.last_issued, "collapsing with a search in flight");
    }
    self.is_expanded = false;
    self.query.clear();
    self.is_loading = false;
    self.results.clear();
    self.no_findings = false;
    self.awaiting = None;
  }

  pub fn view(&self) -> PanelView<'_> {
    if !self.is_expanded {
      PanelView::Collapsed
    } else if self.is_loading {
      PanelView::Loading
    } else if self.results.is_empty() && !self.no_findings {
      PanelView::Prompt
    } else if self.no_findings {
      PanelView::NoResults
    } else {
      PanelView::Results(&self.results)
    }
  }
}
