use super::{Document, FormId, InMemoryDocument, PageDetector, ReportSink};

/// A loaded page: an [`InMemoryDocument`] with its detector wired in
///
/// Plays the host's part: runs the detector's scan at load, invokes it after
/// every mutation (the structural observer), and dispatches submits to every
/// registered listener.
pub struct Page<S> {
    document: InMemoryDocument,
    detector: PageDetector<S>,
}

impl<S: ReportSink> Page<S> {
    /// Load the document and run the initial attachment scan
    pub fn load(document: InMemoryDocument, sink: S) -> Self {
        let mut page = Self { document, detector: PageDetector::new(sink) };
        page.detector.attach_listeners(&mut page.document);
        page
    }

    /// Apply a structural change, then notify the detector
    pub fn mutate<R>(&mut self, change: impl FnOnce(&mut InMemoryDocument) -> R) -> R {
        let result = change(&mut self.document);
        self.detector.on_mutation(&mut self.document);
        result
    }

    /// Re-run the attachment scan without a mutation
    pub fn rescan(&mut self) -> usize {
        self.detector.attach_listeners(&mut self.document)
    }

    /// Submit `form`, invoking each registered listener; returns reports handed off
    pub fn submit(&mut self, form: FormId) -> usize {
        if !self.document.forms().contains(&form) {
            return 0;
        }

        (0..self.document.listener_count(form))
            .filter(|_| self.detector.handle_submit(&self.document, form))
            .count()
    }

    pub fn document(&self) -> &InMemoryDocument {
        &self.document
    }

    pub fn detector(&self) -> &PageDetector<S> {
        &self.detector
    }
}
