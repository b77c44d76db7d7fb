use ratatui::widgets::ListState;

use rstream::MediaPost;

/// How close to the end of the list the selection may get before the next
/// page is requested.
const PREFETCH_MARGIN: usize = 3;

pub struct App {
    /// Posts in the order the session delivered them.
    pub posts: Vec<MediaPost>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last pager status message.
    pub status: String,
    /// The session has no more posts.
    pub exhausted: bool,
    /// A page request is waiting to be sent to the pager.
    wants_page: bool,
    /// A page request has been sent and not yet answered.
    in_flight: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            exhausted: false,
            wants_page: true,
            in_flight: false,
        }
    }

    /// Append a page from the pager. Selection lands on the first post of
    /// the first page.
    pub fn append_page(&mut self, posts: Vec<MediaPost>, exhausted: bool) {
        self.in_flight = false;
        self.exhausted = exhausted;
        self.status = match (posts.len(), exhausted) {
            (0, true) => "End of stream".into(),
            (n, true) => format!("Fetched {n} posts (end of stream)"),
            (n, false) => format!("Fetched {n} posts"),
        };
        self.posts.extend(posts);
        if self.list_state.selected().is_none() && !self.posts.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    /// The pager reported a failure; allow another attempt.
    pub fn page_failed(&mut self, error: &str) {
        self.in_flight = false;
        self.status = format!("Error: {error}");
    }

    /// The session is gone; nothing more can be fetched.
    pub fn session_expired(&mut self) {
        self.in_flight = false;
        self.exhausted = true;
        self.status = "Session expired".into();
    }

    /// Ask for another page unless one is outstanding or the stream ended.
    pub fn request_page(&mut self) {
        if !self.exhausted && !self.in_flight {
            self.wants_page = true;
        }
    }

    /// Take a pending page request, marking it in flight.
    pub fn take_page_request(&mut self) -> bool {
        if !self.wants_page {
            return false;
        }
        self.wants_page = false;
        self.in_flight = true;
        self.status = "Loading…".into();
        true
    }

    fn prefetch_if_near_end(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if i + PREFETCH_MARGIN >= self.posts.len() {
                self.request_page();
            }
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.posts.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.posts.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.prefetch_if_near_end();
    }

    pub fn select_previous(&mut self) {
        if self.posts.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.posts.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.posts.is_empty() {
            self.list_state.select(Some(self.posts.len() - 1));
            self.prefetch_if_near_end();
        }
    }

    pub fn selected_post(&self) -> Option<&MediaPost> {
        self.list_state.selected().and_then(|i| self.posts.get(i))
    }
}
