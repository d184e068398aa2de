/// Full-screen page sequence shown between chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Interstitial {
    index: usize,
    pages: Vec<String>,
    page: usize,
}

impl Interstitial {
    pub(crate) fn new(index: usize, pages: &[String]) -> Self {
        Self {
            index,
            pages: pages.to_vec(),
            page: 0,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn page_number(&self) -> usize {
        self.page
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn current_page(&self) -> &str {
        self.pages.get(self.page).map(String::as_str).unwrap_or("")
    }

    /// Moves to the next page. Returns `true` once the last page has been
    /// dismissed.
    pub(crate) fn advance(&mut self) -> bool {
        if self.page + 1 < self.pages.len() {
            self.page += 1;
            false
        } else {
            true
        }
    }
}
